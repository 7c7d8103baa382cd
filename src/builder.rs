//! Builder pattern API for ergonomic clonotype filtering.
//!
//! This module provides a fluent builder interface for configuring and
//! executing clonotype counting and threshold filtering.
//!
//! # Example
//!
//! ```rust,no_run
//! use clonotrack::builder::ClonotypeFilter;
//! use clonotrack::header::Chain;
//!
//! let counts = ClonotypeFilter::new()
//!     .chain(Chain::Beta)
//!     .min_count(2)?
//!     .count("parsed.tsv")?;
//!
//! for (clonotype, count) in counts {
//!     println!("{clonotype}: {count}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{collections::HashMap, fmt::Debug, io::Write, path::Path};

use crate::{
    error::{BuilderError, ClonotrackError, ThresholdError},
    filter::filter_path_to_writer,
    header::Chain,
    run::count_clonotypes,
};

/// A builder for configuring clonotype counting and filtering.
///
/// Use [`ClonotypeFilter::new()`] to create a new builder, configure it with
/// the fluent API, then call [`count()`](ClonotypeFilter::count) or
/// [`filter_to_writer()`](ClonotypeFilter::filter_to_writer) to execute.
#[derive(Debug, Clone)]
pub struct ClonotypeFilter {
    chain: Option<Chain>,
    min_count: u32,
}

impl Default for ClonotypeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClonotypeFilter {
    /// Creates a new builder with default settings.
    ///
    /// Default settings:
    /// - `chain`: None (must be set before counting)
    /// - `min_count`: 1 (keep every productive clonotype)
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: None,
            min_count: 1,
        }
    }

    /// Sets the chain whose CDR3 column identifies the clonotype.
    #[must_use]
    pub fn chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Sets the minimum count threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if `min_count` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clonotrack::builder::ClonotypeFilter;
    ///
    /// let filter = ClonotypeFilter::new().min_count(5)?;
    /// assert_eq!(filter.get_min_count(), 5);
    /// assert!(ClonotypeFilter::new().min_count(0).is_err());
    /// # Ok::<(), clonotrack::error::ThresholdError>(())
    /// ```
    pub fn min_count(mut self, min_count: u32) -> Result<Self, ThresholdError> {
        if min_count == 0 {
            return Err(ThresholdError {
                value: min_count,
                min: 1,
            });
        }
        self.min_count = min_count;
        Ok(self)
    }

    /// Counts clonotypes in the table at `path`, keeping those that meet the
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain has not been set, or the table cannot be
    /// read, lacks the chain column, or has a malformed record.
    pub fn count<P>(&self, path: P) -> Result<HashMap<String, u32>, BuilderError>
    where
        P: AsRef<Path> + Debug,
    {
        let chain = self.chain.ok_or(BuilderError::ChainNotSet)?;
        let counts = count_clonotypes(&path, chain)?;
        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count >= self.min_count)
            .collect())
    }

    /// Writes the header and every row meeting the threshold to `writer`.
    ///
    /// Returns the number of rows written after the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain has not been set, the table cannot be
    /// filtered, or the writer fails.
    pub fn filter_to_writer<P, W>(&self, path: P, mut writer: W) -> Result<usize, BuilderError>
    where
        P: AsRef<Path> + Debug,
        W: Write,
    {
        let chain = self.chain.ok_or(BuilderError::ChainNotSet)?;
        let kept = filter_path_to_writer(path, chain, self.min_count, &mut writer)?;
        writer
            .flush()
            .map_err(|source| ClonotrackError::WriteError { source })?;
        Ok(kept)
    }

    /// Returns the configured chain, if set.
    #[must_use]
    pub fn get_chain(&self) -> Option<Chain> {
        self.chain
    }

    /// Returns the configured minimum count threshold.
    #[must_use]
    pub fn get_min_count(&self) -> u32 {
        self.min_count
    }
}
