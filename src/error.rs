//! Error types for clonotrack.
//!
//! This module provides exhaustive, strongly-typed errors for all operations
//! in the library, enabling precise error handling and informative messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::header::Chain;

/// Errors that can occur in clonotrack operations.
#[derive(Debug, Error)]
pub enum ClonotrackError {
    /// The sequence column for a chain could not be resolved from the header.
    #[error("no column for the {chain} chain in the header of '{path}'")]
    MissingColumn { chain: Chain, path: PathBuf },

    /// A record has fewer fields than the column being read.
    #[error("record on line {line} has {fields} fields, cannot read column {column}")]
    MalformedRecord {
        line: usize,
        column: usize,
        fields: usize,
    },

    /// A numeric field could not be parsed.
    #[error("record on line {line}: column {column} is not an integer: '{value}'")]
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },

    /// Failed to read a TSV table.
    #[error("failed to read table '{path}': {source}")]
    TableRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A dataset folder contained no `.tsv` files.
    #[error("no .tsv files found in '{path}'")]
    EmptyDataset { path: PathBuf },

    /// Failed to read a FASTA or quality file.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A quality file line could not be parsed.
    #[error("malformed quality file on line {line}: {details}")]
    MalformedQuality { line: usize, details: String },

    /// A paired chain has no quality scores.
    #[error("no quality scores for sequence '{id}'")]
    MissingQuality { id: String },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a finished output into place.
    #[error("failed to finalize output '{path}': {source}")]
    Persist {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },
}

/// Error for an invalid frequency threshold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("minimum count {value} is out of range: must be at least {min}")]
pub struct ThresholdError {
    /// The rejected threshold.
    pub value: u32,
    /// Smallest accepted threshold.
    pub min: u32,
}

impl From<std::io::Error> for ClonotrackError {
    fn from(source: std::io::Error) -> Self {
        ClonotrackError::WriteError { source }
    }
}

impl From<serde_json::Error> for ClonotrackError {
    fn from(source: serde_json::Error) -> Self {
        ClonotrackError::JsonError { source }
    }
}

/// Errors that can occur when using the builder API.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Chain was not set before calling a filtering method.
    #[error("chain not set; call .chain() first")]
    ChainNotSet,

    /// Invalid threshold provided.
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    /// Error reading, filtering or writing a table.
    #[error(transparent)]
    Clonotrack(#[from] ClonotrackError),
}
