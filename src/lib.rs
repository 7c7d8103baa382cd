//! # clonotrack
//!
//! Post-processing of parsed T-cell-receptor repertoires.
//!
//! Every workflow is two passes over tables read once into memory: the first
//! pass builds a [`FrequencyMap`](frequency::FrequencyMap) of clonotype
//! occurrences, the second replays the records against the finished counts.
//!
//! - [`filter`]: keep the rows of a table whose clonotype meets a threshold
//! - [`classify`]: split clonotypes of a donor cohort into private and public
//!   and tally their nucleotide diversity, insertions and glycines
//! - [`pairing`]: pair alpha and beta reads with their quality scores
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use clonotrack::builder::ClonotypeFilter;
//! use clonotrack::header::Chain;
//!
//! let kept = ClonotypeFilter::new()
//!     .chain(Chain::Beta)
//!     .min_count(2)?
//!     .filter_to_writer("parsed.tsv", std::io::stdout())?;
//! eprintln!("kept {kept} rows");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Features
//!
//! - `tracing`: structured log events for each pass (enabled by default)

pub mod builder;
pub mod classify;
pub mod cli;
pub mod error;
pub mod filter;
pub mod frequency;
pub mod header;
pub mod output;
pub mod pairing;
pub mod record;
pub mod run;
pub mod table;
