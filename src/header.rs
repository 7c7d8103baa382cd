//! Header-row column resolution.
//!
//! Parsed repertoire tables name the CDR3 amino-acid column of each chain
//! (`cdr3a` for alpha, `cdr3b` for beta). This module maps a chain to the
//! zero-based index of that column.
//!
//! # Example
//!
//! ```rust
//! use clonotrack::header::{find_chain_column, Chain};
//!
//! let header = "clone_id\tcdr3a\tcdr3b\n";
//! assert_eq!(find_chain_column(header, Chain::Alpha), Some(1));
//! assert_eq!(find_chain_column(header, Chain::Beta), Some(2));
//! assert_eq!(find_chain_column("clone_id\tcount\n", Chain::Beta), None);
//! ```

use clap::ValueEnum;

use crate::record::strip_terminator;

/// TCR chain whose CDR3 column holds the clonotype key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Chain {
    /// Alpha chain (`cdr3a` column).
    Alpha,
    /// Beta chain (`cdr3b` column).
    Beta,
}

impl Chain {
    /// Header name of the chain's CDR3 column.
    #[must_use]
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Alpha => "cdr3a",
            Self::Beta => "cdr3b",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alpha => write!(f, "alpha"),
            Self::Beta => write!(f, "beta"),
        }
    }
}

/// Returns the index of `chain`'s column in a tab-separated header row.
///
/// When the column name occurs more than once the last occurrence wins.
/// `None` means the column could not be resolved; callers must not index
/// records in that case.
#[must_use]
pub fn find_chain_column(header: &str, chain: Chain) -> Option<usize> {
    strip_terminator(header)
        .split('\t')
        .enumerate()
        .filter(|(_, name)| *name == chain.column_name())
        .map(|(i, _)| i)
        .last()
}
