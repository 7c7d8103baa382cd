//! Clonotype occurrence counting.
//!
//! This is the first of the two passes over a dataset: every qualifying
//! record contributes to the count of its sequence key. What counts as one
//! occurrence depends on the [`OccurrenceMode`].
//!
//! # Example
//!
//! ```rust
//! use clonotrack::frequency::{count, OccurrenceMode};
//! use clonotrack::record::Record;
//! use clonotrack::table::SourceId;
//!
//! let records = vec![
//!     Record::parse(2, "AAA\t1\n"),
//!     Record::parse(3, "AAA\t1\n"),
//!     Record::parse(4, "BBB\t1\n"),
//! ];
//! let freq = count(
//!     records.iter().map(|r| (SourceId(0), r)),
//!     |r| r.field(0),
//!     OccurrenceMode::PerRecord,
//! )?;
//!
//! assert_eq!(freq.get_or_default("AAA"), 2);
//! assert_eq!(freq.get_or_default("BBB"), 1);
//! assert_eq!(freq.get_or_default("CCC"), 0);
//! # Ok::<(), clonotrack::error::ClonotrackError>(())
//! ```

use std::collections::HashMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::{
    error::ClonotrackError,
    record::{is_productive, Record},
    table::SourceId,
};

#[cfg(feature = "tracing")]
use tracing::{info, info_span};

/// Frame annotation of a read whose reading frame is confirmed.
pub const IN_FRAME: &str = "In";

/// What a single occurrence of a sequence key is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceMode {
    /// Every qualifying record counts once.
    PerRecord,
    /// A key counts at most once per source, and only records whose
    /// `frame_column` equals [`IN_FRAME`] qualify.
    PerSource {
        /// Column holding the frame annotation.
        frame_column: usize,
    },
}

/// Mapping from sequence key to occurrence count.
///
/// Absent keys read as zero; every stored count is at least one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap(FxHashMap<String, u32>);

impl FrequencyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of `key`, or zero if it was never counted.
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Returns `true` if `key` was counted at least once.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no key was counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries with a count of at least `min_count`, sorted by descending
    /// count and then by key.
    #[must_use]
    pub fn ranked(&self, min_count: u32) -> Vec<SequenceCount> {
        let mut ranked: Vec<_> = self
            .iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(sequence, count)| SequenceCount {
                sequence: sequence.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sequence.cmp(&b.sequence)));
        ranked
    }

    fn increment(&mut self, key: &str) {
        match self.0.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(key.to_string(), 1);
            }
        }
    }
}

impl From<FrequencyMap> for HashMap<String, u32> {
    fn from(map: FrequencyMap) -> Self {
        map.0.into_iter().collect()
    }
}

/// A sequence with its count, used for ranked and JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCount {
    pub sequence: String,
    pub count: u32,
}

/// Counts occurrences of the key extracted from each record.
///
/// Records whose key fails [`is_productive`] never contribute. In
/// [`OccurrenceMode::PerSource`] records that are not in frame never
/// contribute either, and each key is counted once per [`SourceId`].
///
/// # Errors
///
/// Propagates the first error returned by `key`, and returns
/// [`ClonotrackError::MalformedRecord`] if a record lacks the frame column.
pub fn count<'a, I, K>(
    records: I,
    key: K,
    mode: OccurrenceMode,
) -> Result<FrequencyMap, ClonotrackError>
where
    I: IntoIterator<Item = (SourceId, &'a Record)>,
    K: Fn(&'a Record) -> Result<&'a str, ClonotrackError>,
{
    #[cfg(feature = "tracing")]
    let _span = info_span!("count_clonotypes", mode = ?mode).entered();

    let mut map = FrequencyMap::new();
    let mut seen: FxHashSet<(SourceId, &'a str)> = FxHashSet::default();

    for (source, record) in records {
        let sequence = key(record)?;
        if !is_productive(sequence) {
            continue;
        }
        match mode {
            OccurrenceMode::PerRecord => map.increment(sequence),
            OccurrenceMode::PerSource { frame_column } => {
                if record.field(frame_column)? != IN_FRAME {
                    continue;
                }
                if seen.insert((source, sequence)) {
                    map.increment(sequence);
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    info!(clonotypes = map.len(), "Clonotype counting complete");

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<Record> {
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| Record::parse(i + 2, *l))
            .collect()
    }

    #[test]
    fn per_record_counts_duplicates() {
        let records = rows(&["AAA\t1\n", "AAA\t1\n", "BBB\t1\n"]);
        let freq = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(0),
            OccurrenceMode::PerRecord,
        )
        .unwrap();
        assert_eq!(freq.len(), 2);
        assert_eq!(freq.get_or_default("AAA"), 2);
        assert_eq!(freq.get_or_default("BBB"), 1);
    }

    #[test]
    fn non_productive_keys_are_not_counted() {
        let records = rows(&["CA#SGR\n", "CAS*R\n", "C\n", "CASR\n"]);
        let freq = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(0),
            OccurrenceMode::PerRecord,
        )
        .unwrap();
        assert!(!freq.contains("CA#SGR"));
        assert!(!freq.contains("CAS*R"));
        assert!(!freq.contains("C"));
        assert_eq!(freq.get_or_default("CASR"), 1);
    }

    #[test]
    fn per_source_counts_distinct_sources() {
        let a = rows(&["GAGY\tIn\n", "GAGY\tIn\n", "GAGY\tIn\n"]);
        let b = rows(&["GAGY\tIn\n", "CASF\tIn\n"]);
        let records = a
            .iter()
            .map(|r| (SourceId(0), r))
            .chain(b.iter().map(|r| (SourceId(1), r)));
        let freq = count(
            records,
            |r| r.field(0),
            OccurrenceMode::PerSource { frame_column: 1 },
        )
        .unwrap();
        assert_eq!(freq.get_or_default("GAGY"), 2);
        assert_eq!(freq.get_or_default("CASF"), 1);
    }

    #[test]
    fn per_source_requires_in_frame() {
        let records = rows(&["GAGY\tOut\n", "CASF\tIn\n"]);
        let freq = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(0),
            OccurrenceMode::PerSource { frame_column: 1 },
        )
        .unwrap();
        assert!(!freq.contains("GAGY"));
        assert_eq!(freq.get_or_default("CASF"), 1);
    }

    #[test]
    fn per_source_missing_frame_column_is_malformed() {
        let records = rows(&["GAGY\n"]);
        let err = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(0),
            OccurrenceMode::PerSource { frame_column: 38 },
        )
        .unwrap_err();
        assert!(matches!(err, ClonotrackError::MalformedRecord { column: 38, .. }));
    }

    #[test]
    fn key_extraction_error_aborts() {
        let records = rows(&["AAA\n"]);
        let result = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(3),
            OccurrenceMode::PerRecord,
        );
        assert!(result.is_err());
    }

    #[test]
    fn ranked_orders_by_count_then_key() {
        let records = rows(&["BB\n", "AA\n", "CC\n", "CC\n"]);
        let freq = count(
            records.iter().map(|r| (SourceId(0), r)),
            |r| r.field(0),
            OccurrenceMode::PerRecord,
        )
        .unwrap();
        let ranked: Vec<_> = freq
            .ranked(1)
            .into_iter()
            .map(|c| (c.sequence, c.count))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("CC".to_string(), 2),
                ("AA".to_string(), 1),
                ("BB".to_string(), 1)
            ]
        );
        assert_eq!(freq.ranked(2).len(), 1);
    }
}
