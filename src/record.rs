//! Tab-separated records and the productive-sequence filter.

use crate::error::ClonotrackError;

/// Marker for a premature stop codon in a translated sequence.
pub const STOP_CODON: char = '*';

/// Marker for an unresolved or ambiguous base call.
pub const AMBIGUOUS: char = '#';

/// Shortest sequence considered a clonotype.
pub const MIN_SEQUENCE_LEN: usize = 2;

/// One data line of a TSV table.
///
/// The original line, terminator included, is kept so that filtered output
/// reproduces the input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line: usize,
    raw: String,
    fields: Vec<String>,
}

impl Record {
    /// Splits `raw` on tabs. `line` is the 1-based line number in the source.
    #[must_use]
    pub fn parse(line: usize, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let fields = strip_terminator(&raw)
            .split('\t')
            .map(String::from)
            .collect();
        Self { line, raw, fields }
    }

    /// Returns the field at `column`.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::MalformedRecord`] if the record has fewer
    /// than `column + 1` fields.
    pub fn field(&self, column: usize) -> Result<&str, ClonotrackError> {
        self.fields
            .get(column)
            .map(String::as_str)
            .ok_or(ClonotrackError::MalformedRecord {
                line: self.line,
                column,
                fields: self.fields.len(),
            })
    }

    /// Parses the field at `column` as an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::MalformedRecord`] for a missing field and
    /// [`ClonotrackError::InvalidNumber`] for a non-numeric one.
    pub fn numeric_field(&self, column: usize) -> Result<u32, ClonotrackError> {
        let value = self.field(column)?;
        value
            .trim()
            .parse()
            .map_err(|_| ClonotrackError::InvalidNumber {
                line: self.line,
                column,
                value: value.to_string(),
            })
    }

    /// 1-based line number in the source file.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The line exactly as read, terminator included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Returns `true` if `key` is a productive clonotype sequence.
///
/// A key is productive when it holds no stop codon, no ambiguous call and
/// is at least [`MIN_SEQUENCE_LEN`] characters long.
///
/// ```rust
/// use clonotrack::record::is_productive;
///
/// assert!(is_productive("CASSLGQETQYF"));
/// assert!(!is_productive("CA#SGR"));
/// assert!(!is_productive("CASS*GR"));
/// assert!(!is_productive("C"));
/// ```
#[must_use]
pub fn is_productive(key: &str) -> bool {
    key.chars().count() >= MIN_SEQUENCE_LEN && !key.contains([STOP_CODON, AMBIGUOUS])
}

/// Removes one trailing `\n` or `\r\n`.
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
