//! Command entry points.
//!
//! One function per subcommand. Each reads its input completely, runs the
//! counting pass and then the filtering or classification pass, and only then
//! writes output.

use std::{
    collections::HashMap,
    fmt::Debug,
    io::{stdout, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    classify::{ColumnLayout, EpitopeAnalysis, InsertionFormula},
    cli::OutputFormat,
    error::ClonotrackError,
    filter::{filter_table, resolve_chain_column},
    frequency::{count, FrequencyMap, OccurrenceMode},
    header::Chain,
    output::{write_atomically, write_classified},
    pairing::{pair_chains, read_qualities, read_sequences, write_pairs},
    table::{Dataset, SourceId, Table},
};

#[cfg(feature = "tracing")]
use tracing::info;

/// Filters the table at `path` to clonotypes of `chain` seen at least
/// `min_count` times.
///
/// Writes to `output` if given, otherwise to stdout. Returns the number of
/// records kept.
///
/// # Errors
///
/// Returns an error if the table cannot be read, the chain column is
/// missing, a record is malformed, or output cannot be written.
pub fn run_filter<P>(
    path: P,
    chain: Chain,
    min_count: u32,
    output: Option<&Path>,
) -> Result<usize, ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    let table = Table::from_path(&path)?;
    let column = resolve_chain_column(&table, chain)?;
    let filtered = filter_table(&table, column, min_count)?;

    match output {
        Some(target) => {
            write_atomically(target, |file| filtered.write_to(file))?;
        }
        None => {
            let mut buf = BufWriter::new(stdout());
            filtered.write_to(&mut buf)?;
            buf.flush()?;
        }
    }
    Ok(filtered.records.len())
}

/// Classifies the clonotypes of every `.tsv` file in `folder` and writes the
/// six private/public statistic tables.
///
/// Tables are named `{prefix}_{private|public}_{nt|ins|gly}.txt`, with
/// `prefix` defaulting to `folder`.
///
/// # Errors
///
/// Returns an error if the folder holds no tables, a table cannot be read or
/// is malformed, or an output cannot be written.
pub fn run_analyze<P>(
    folder: P,
    prefix: Option<&Path>,
    formula: InsertionFormula,
) -> Result<Vec<PathBuf>, ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    let dataset = Dataset::from_folder(&folder)?;

    #[cfg(feature = "tracing")]
    info!(folder = ?folder, sources = dataset.len(), "Loaded dataset");

    let analysis = EpitopeAnalysis::run(&dataset, ColumnLayout::default())?;
    let classified = analysis.classify();
    let prefix = prefix.unwrap_or_else(|| folder.as_ref());
    write_classified(prefix, &classified, formula)
}

/// Pairs alpha and beta chains of `fasta` with their qualities from `qual`
/// and writes the paired table to `output`.
///
/// Returns the number of pairs written.
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, a paired chain has
/// no qualities, or the output cannot be written.
pub fn run_pair<P, Q, O>(
    fasta: P,
    qual: Q,
    output: O,
    subject: &str,
) -> Result<usize, ClonotrackError>
where
    P: AsRef<Path> + Debug,
    Q: AsRef<Path> + Debug,
    O: AsRef<Path> + Debug,
{
    let sequences = read_sequences(fasta)?;
    let qualities = read_qualities(qual)?;
    let pairs = pair_chains(&sequences, &qualities, subject)?;
    write_atomically(output, |file| write_pairs(file, &pairs))?;
    Ok(pairs.len())
}

/// Counts the clonotypes of `chain` in the table at `path`.
///
/// This is the main library API for counting without writing output.
///
/// # Errors
///
/// Returns an error if the table cannot be read, the chain column is
/// missing or a record is malformed.
pub fn count_clonotypes<P>(path: P, chain: Chain) -> Result<HashMap<String, u32>, ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    Ok(count_table(&Table::from_path(&path)?, chain)?.into())
}

fn count_table(table: &Table, chain: Chain) -> Result<FrequencyMap, ClonotrackError> {
    let column = resolve_chain_column(table, chain)?;
    count(
        table.records().iter().map(|r| (SourceId(0), r)),
        |r| r.field(column),
        OccurrenceMode::PerRecord,
    )
}

/// Counts the clonotypes of `chain` and writes those seen at least
/// `min_count` times to stdout, most frequent first.
///
/// # Errors
///
/// Returns an error if counting fails or output cannot be written.
pub fn run_count<P>(
    path: P,
    chain: Chain,
    min_count: u32,
    format: OutputFormat,
) -> Result<(), ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    let freq = count_table(&Table::from_path(&path)?, chain)?;
    let mut buf = BufWriter::new(stdout());
    write_counts(&mut buf, &freq, min_count, format)?;
    buf.flush()?;
    Ok(())
}

/// Writes ranked counts in `format`.
///
/// # Errors
///
/// Returns [`ClonotrackError::WriteError`] or [`ClonotrackError::JsonError`].
pub fn write_counts<W: Write>(
    writer: &mut W,
    freq: &FrequencyMap,
    min_count: u32,
    format: OutputFormat,
) -> Result<(), ClonotrackError> {
    let ranked = freq.ranked(min_count);
    match format {
        OutputFormat::Tsv => {
            for entry in ranked {
                writeln!(writer, "{}\t{}", entry.sequence, entry.count)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &ranked)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
