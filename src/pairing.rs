//! Alpha/beta chain pairing for TCR-dist input.
//!
//! Alpha and beta reads of the same cell share a header that differs only in
//! the chain prefix (`tra...` vs `trb...`). Sequences come from a FASTA file
//! and base qualities from a matching `.qual` file; paired chains are written
//! as one row per cell.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use bio::io::fasta;
use rustc_hash::FxHashMap;

use crate::error::ClonotrackError;

#[cfg(feature = "tracing")]
use tracing::{info, warn};

/// Epitopes recognised in read names, in lookup order.
pub const EPITOPES: [&str; 3] = ["NAI", "GLC", "YVL"];

/// Header of the paired output table.
pub const PAIRED_HEADER: [&str; 7] = [
    "id", "epitope", "subject", "a_nucseq", "b_nucseq", "a_quals", "b_quals",
];

const ALPHA_PREFIX: &str = "tra";
const BETA_PREFIX: &str = "trb";

/// Read key: the record name up to its first `_`.
fn read_key(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Reads every FASTA record of `path`, keyed by [`read_key`] of its id.
///
/// # Errors
///
/// Returns [`ClonotrackError::SequenceRead`] if the file cannot be opened or
/// parsed.
pub fn read_sequences<P>(path: P) -> Result<FxHashMap<String, String>, ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref();
    let read_err = |source| ClonotrackError::SequenceRead {
        source,
        path: path.to_path_buf(),
    };
    let reader = fasta::Reader::new(File::open(path).map_err(read_err)?);

    let mut sequences = FxHashMap::default();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let seq = String::from_utf8_lossy(record.seq()).into_owned();
        sequences.insert(read_key(record.id()).to_string(), seq);
    }
    Ok(sequences)
}

/// Parses a quality file: `>` header lines, each followed by one or more
/// lines of whitespace-separated integer scores.
///
/// Scores of one read are joined with `.`.
///
/// # Errors
///
/// Returns [`ClonotrackError::MalformedQuality`] for scores before the first
/// header or scores that are not integers, and
/// [`ClonotrackError::SequenceRead`] on I/O failure.
pub fn parse_qualities<R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<FxHashMap<String, String>, ClonotrackError> {
    let mut qualities = FxHashMap::default();
    let mut current: Option<(String, Vec<String>)> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ClonotrackError::SequenceRead {
            source,
            path: path.to_path_buf(),
        })?;
        if let Some(header) = line.strip_prefix('>') {
            if let Some((key, scores)) = current.take() {
                qualities.insert(key, scores.join("."));
            }
            let name = header.split_whitespace().next().unwrap_or("");
            current = Some((read_key(name).to_string(), Vec::new()));
            continue;
        }
        let Some((_, scores)) = current.as_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(ClonotrackError::MalformedQuality {
                line: i + 1,
                details: "scores before the first header".to_string(),
            });
        };
        for token in line.split_whitespace() {
            let score: i32 = token
                .parse()
                .map_err(|_| ClonotrackError::MalformedQuality {
                    line: i + 1,
                    details: format!("'{token}' is not an integer score"),
                })?;
            scores.push(score.to_string());
        }
    }
    if let Some((key, scores)) = current {
        qualities.insert(key, scores.join("."));
    }
    Ok(qualities)
}

/// Reads a quality file from `path`. See [`parse_qualities`].
///
/// # Errors
///
/// Same as [`parse_qualities`], plus failure to open the file.
pub fn read_qualities<P>(path: P) -> Result<FxHashMap<String, String>, ClonotrackError>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ClonotrackError::SequenceRead {
        source,
        path: path.to_path_buf(),
    })?;
    parse_qualities(BufReader::new(file), path)
}

/// First epitope whose name occurs in the upper-cased read key.
#[must_use]
pub fn epitope_of(key: &str) -> Option<&'static str> {
    let upper = key.to_uppercase();
    EPITOPES.iter().copied().find(|e| upper.contains(e))
}

/// One cell with both chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedReceptor {
    pub id: String,
    pub epitope: String,
    pub subject: String,
    pub alpha_seq: String,
    pub beta_seq: String,
    pub alpha_quals: String,
    pub beta_quals: String,
}

impl PairedReceptor {
    fn fields(&self) -> [&str; 7] {
        [
            self.id.as_str(),
            self.epitope.as_str(),
            self.subject.as_str(),
            self.alpha_seq.as_str(),
            self.beta_seq.as_str(),
            self.alpha_quals.as_str(),
            self.beta_quals.as_str(),
        ]
    }
}

/// Pairs every alpha read with its beta partner.
///
/// Alpha reads without a beta partner are skipped with a warning. Output is
/// sorted by id.
///
/// # Errors
///
/// Returns [`ClonotrackError::MissingQuality`] if either chain of a pair
/// has no quality scores.
pub fn pair_chains(
    sequences: &FxHashMap<String, String>,
    qualities: &FxHashMap<String, String>,
    subject: &str,
) -> Result<Vec<PairedReceptor>, ClonotrackError> {
    let quality = |key: &str| {
        qualities
            .get(key)
            .cloned()
            .ok_or_else(|| ClonotrackError::MissingQuality { id: key.to_string() })
    };

    let mut paired = BTreeMap::new();
    for (alpha_key, alpha_seq) in sequences {
        if !alpha_key.starts_with(ALPHA_PREFIX) {
            continue;
        }
        let beta_key = alpha_key.replace(ALPHA_PREFIX, BETA_PREFIX);
        let Some(beta_seq) = sequences.get(&beta_key) else {
            #[cfg(feature = "tracing")]
            warn!(read = %alpha_key, "Missing beta chain");
            continue;
        };

        let id: String = alpha_key.chars().skip(ALPHA_PREFIX.len() + 1).collect();
        paired.insert(
            alpha_key.clone(),
            PairedReceptor {
                id,
                epitope: epitope_of(alpha_key).unwrap_or_default().to_string(),
                subject: subject.to_string(),
                alpha_seq: alpha_seq.clone(),
                beta_seq: beta_seq.clone(),
                alpha_quals: quality(alpha_key)?,
                beta_quals: quality(&beta_key)?,
            },
        );
    }

    #[cfg(feature = "tracing")]
    info!(pairs = paired.len(), "Chain pairing complete");

    Ok(paired.into_values().collect())
}

/// Writes the paired table with its header.
///
/// # Errors
///
/// Returns [`ClonotrackError::WriteError`] if the writer fails.
pub fn write_pairs<W: Write>(
    writer: &mut W,
    pairs: &[PairedReceptor],
) -> Result<(), ClonotrackError> {
    writeln!(writer, "{}", PAIRED_HEADER.join("\t"))?;
    for pair in pairs {
        writeln!(writer, "{}", pair.fields().join("\t"))?;
    }
    Ok(())
}
