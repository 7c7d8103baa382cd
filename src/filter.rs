//! Threshold filtering of a table by clonotype frequency.
//!
//! The second pass of the filter workflow: records are replayed in their
//! original order and kept only if their clonotype occurs often enough.

use std::{fmt::Debug, io::Write, path::Path};

use crate::{
    error::ClonotrackError,
    frequency::{count, FrequencyMap, OccurrenceMode},
    header::{find_chain_column, Chain},
    record::{is_productive, Record},
    table::{SourceId, Table},
};

#[cfg(feature = "tracing")]
use tracing::info;

/// Lazy iterator over the records of a table that meet a frequency threshold.
///
/// Yields `Err` for a record whose key column is missing; the caller is
/// expected to stop at the first error.
pub struct ThresholdFilter<'a, 'f> {
    records: std::slice::Iter<'a, Record>,
    freq: &'f FrequencyMap,
    key_column: usize,
    min_count: u32,
}

impl<'a> Iterator for ThresholdFilter<'a, '_> {
    type Item = Result<&'a Record, ClonotrackError>;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.records.by_ref() {
            let key = match record.field(self.key_column) {
                Ok(key) => key,
                Err(e) => return Some(Err(e)),
            };
            if is_productive(key) && self.freq.get_or_default(key) >= self.min_count {
                return Some(Ok(record));
            }
        }
        None
    }
}

/// Returns the records of `records` whose key meets `min_count`.
///
/// A key that is absent from `freq` counts as zero. Non-productive keys are
/// never emitted, whatever the threshold. Order is preserved.
///
/// # Example
///
/// ```rust
/// use clonotrack::filter::filter_by_threshold;
/// use clonotrack::frequency::{count, OccurrenceMode};
/// use clonotrack::record::Record;
/// use clonotrack::table::SourceId;
///
/// let records = vec![
///     Record::parse(2, "AAA\t1\n"),
///     Record::parse(3, "BBB\t1\n"),
///     Record::parse(4, "AAA\t1\n"),
/// ];
/// let freq = count(
///     records.iter().map(|r| (SourceId(0), r)),
///     |r| r.field(0),
///     OccurrenceMode::PerRecord,
/// )?;
/// let kept = filter_by_threshold(&records, &freq, 0, 2)
///     .map(|r| r.map(|r| r.line()))
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(kept, vec![2, 4]);
/// # Ok::<(), clonotrack::error::ClonotrackError>(())
/// ```
pub fn filter_by_threshold<'a, 'f>(
    records: &'a [Record],
    freq: &'f FrequencyMap,
    key_column: usize,
    min_count: u32,
) -> ThresholdFilter<'a, 'f> {
    ThresholdFilter {
        records: records.iter(),
        freq,
        key_column,
        min_count,
    }
}

/// Result of running both passes over one table.
#[derive(Debug)]
pub struct FilteredTable<'a> {
    /// Header line, emitted unchanged.
    pub header: &'a str,
    /// Records that met the threshold, in input order.
    pub records: Vec<&'a Record>,
}

impl FilteredTable<'_> {
    /// Writes the header followed by every kept record, verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::WriteError`] if the writer fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ClonotrackError> {
        writer.write_all(self.header.as_bytes())?;
        for record in &self.records {
            writer.write_all(record.raw().as_bytes())?;
        }
        Ok(())
    }
}

/// Counts the clonotypes of `table` and keeps the records meeting `min_count`.
///
/// Pass 1 counts every productive key of `key_column` per record; pass 2
/// replays the table against the finished counts.
///
/// # Errors
///
/// Returns [`ClonotrackError::MalformedRecord`] if any record lacks
/// `key_column`. Nothing is returned in that case.
pub fn filter_table(
    table: &Table,
    key_column: usize,
    min_count: u32,
) -> Result<FilteredTable<'_>, ClonotrackError> {
    let freq = count(
        table.records().iter().map(|r| (SourceId(0), r)),
        |r| r.field(key_column),
        OccurrenceMode::PerRecord,
    )?;

    let records = filter_by_threshold(table.records(), &freq, key_column, min_count)
        .collect::<Result<Vec<_>, _>>()?;

    #[cfg(feature = "tracing")]
    info!(
        path = ?table.path(),
        kept = records.len(),
        total = table.records().len(),
        min_count,
        "Threshold filter complete"
    );

    Ok(FilteredTable {
        header: table.header(),
        records,
    })
}

/// Resolves the column of `chain` in `table`'s header.
///
/// # Errors
///
/// Returns [`ClonotrackError::MissingColumn`] if the header has no column
/// for `chain`.
pub fn resolve_chain_column(table: &Table, chain: Chain) -> Result<usize, ClonotrackError> {
    find_chain_column(table.header(), chain).ok_or_else(|| ClonotrackError::MissingColumn {
        chain,
        path: table.path().to_path_buf(),
    })
}

/// Reads `path`, resolves `chain`'s column and filters by `min_count`,
/// writing the result to `writer`.
///
/// Output is produced only after both passes have succeeded.
///
/// # Errors
///
/// Returns an error if the table cannot be read, the column cannot be
/// resolved, a record is malformed, or the writer fails.
pub fn filter_path_to_writer<P, W>(
    path: P,
    chain: Chain,
    min_count: u32,
    writer: &mut W,
) -> Result<usize, ClonotrackError>
where
    P: AsRef<Path> + Debug,
    W: Write,
{
    let table = Table::from_path(&path)?;
    let column = resolve_chain_column(&table, chain)?;
    let filtered = filter_table(&table, column, min_count)?;
    filtered.write_to(writer)?;
    Ok(filtered.records.len())
}
