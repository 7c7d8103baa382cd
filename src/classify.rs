//! Private/public classification of clonotypes across donors.
//!
//! An epitope-level dataset is one TSV file per donor. A clonotype (amino-acid
//! CDR3 sequence) is *public* when it occurs in-frame in more than one donor
//! file and *private* otherwise. For each category three statistics are
//! reported:
//!
//! - nucleotide diversity: in-frame records carrying each amino-acid sequence;
//! - insertions: N1/N2 insertion counts of each distinct nucleotide sequence,
//!   taken from the first record seen for it;
//! - glycines: number of `G` residues in each amino-acid sequence.
//!
//! Insertions are grouped by nucleotide sequence while the category is
//! decided by the amino-acid sequence that nucleotide sequence encodes.
//!
//! # Example
//!
//! ```rust
//! use clonotrack::classify::{Classification, ColumnLayout, EpitopeAnalysis};
//! use clonotrack::table::{Dataset, Table};
//! use std::io::Cursor;
//!
//! let layout = ColumnLayout {
//!     nucleotide: 0,
//!     amino_acid: 1,
//!     n1_insertions: 2,
//!     n2_insertions: 3,
//!     frame: 4,
//! };
//! let donor1 = "nt\taa\tn1\tn2\tframe\nGGT\tGAGY\t1\t2\tIn\n";
//! let donor2 = "nt\taa\tn1\tn2\tframe\nGGA\tGAGY\t0\t3\tIn\nTTT\tCASF\t1\t1\tIn\n";
//! let dataset = Dataset::new(vec![
//!     Table::from_reader(Cursor::new(donor1), "d1.tsv")?,
//!     Table::from_reader(Cursor::new(donor2), "d2.tsv")?,
//! ]);
//!
//! let analysis = EpitopeAnalysis::run(&dataset, layout)?;
//! assert_eq!(analysis.classification("GAGY"), Classification::Public);
//! assert_eq!(analysis.classification("CASF"), Classification::Private);
//! # Ok::<(), clonotrack::error::ClonotrackError>(())
//! ```

use clap::ValueEnum;
use rustc_hash::FxHashMap;

use crate::{
    error::ClonotrackError,
    frequency::{count, FrequencyMap, OccurrenceMode, IN_FRAME},
    record::is_productive,
    table::Dataset,
};

#[cfg(feature = "tracing")]
use tracing::{debug, info, info_span};

/// Residue counted by the glycine statistic.
pub const GLYCINE: char = 'G';

/// Which bucket a clonotype belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Seen in exactly one source.
    Private,
    /// Seen in more than one source.
    Public,
}

impl Classification {
    /// Classifies an occurrence count. Zero (an unseen key) is private.
    #[must_use]
    pub fn from_count(count: u32) -> Self {
        if count > 1 {
            Self::Public
        } else {
            Self::Private
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// How the reported insertion count is derived from the N1 and N2 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InsertionFormula {
    /// N1 + N2.
    #[default]
    Sum,
    /// N1 + N1, matching tables produced by the earlier analysis script.
    #[value(name = "doubled-n1")]
    DoubledN1,
}

impl InsertionFormula {
    /// Applies the formula, saturating at `u32::MAX`.
    #[must_use]
    pub fn apply(self, n1: u32, n2: u32) -> u32 {
        match self {
            Self::Sum => n1.saturating_add(n2),
            Self::DoubledN1 => n1.saturating_add(n1),
        }
    }
}

/// Column positions in the per-donor tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub nucleotide: usize,
    pub amino_acid: usize,
    pub n1_insertions: usize,
    pub n2_insertions: usize,
    pub frame: usize,
}

impl Default for ColumnLayout {
    /// Layout of the parsed repertoire export.
    fn default() -> Self {
        Self {
            nucleotide: 0,
            amino_acid: 1,
            n1_insertions: 27,
            n2_insertions: 30,
            frame: 38,
        }
    }
}

/// Per-amino-acid statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AminoAcidRow {
    pub amino_acid: String,
    /// In-frame records carrying this amino-acid sequence.
    pub nucleotide_records: u32,
    pub glycines: usize,
}

/// Insertion statistics of one nucleotide sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRow {
    pub nucleotide: String,
    pub amino_acid: String,
    pub n1: u32,
    pub n2: u32,
}

impl InsertionRow {
    /// Insertion count under `formula`.
    #[must_use]
    pub fn insertions(&self, formula: InsertionFormula) -> u32 {
        formula.apply(self.n1, self.n2)
    }
}

/// Statistics routed to one category, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub amino_acids: Vec<AminoAcidRow>,
    pub insertions: Vec<InsertionRow>,
}

/// Both categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub private: CategoryStats,
    pub public: CategoryStats,
}

impl Classified {
    /// Statistics of one category.
    #[must_use]
    pub fn category(&self, classification: Classification) -> &CategoryStats {
        match classification {
            Classification::Private => &self.private,
            Classification::Public => &self.public,
        }
    }

    fn category_mut(&mut self, classification: Classification) -> &mut CategoryStats {
        match classification {
            Classification::Private => &mut self.private,
            Classification::Public => &mut self.public,
        }
    }
}

/// Number of glycine residues in an amino-acid sequence.
///
/// ```rust
/// assert_eq!(clonotrack::classify::glycine_count("GAGY"), 2);
/// ```
#[must_use]
pub fn glycine_count(amino_acid: &str) -> usize {
    amino_acid.matches(GLYCINE).count()
}

#[derive(Debug, Clone)]
struct FirstInsertion {
    amino_acid: String,
    n1: u32,
    n2: u32,
}

/// Counts and tallies for one epitope-level dataset.
#[derive(Debug, Clone)]
pub struct EpitopeAnalysis {
    occurrence: FrequencyMap,
    nucleotide_records: FxHashMap<String, u32>,
    insertions: FxHashMap<String, FirstInsertion>,
}

impl EpitopeAnalysis {
    /// Runs both passes over `dataset`.
    ///
    /// Pass 1 counts, per amino-acid sequence, the sources with an in-frame
    /// productive record. Pass 2 tallies nucleotide diversity and the first
    /// insertion counts per nucleotide sequence over the same records.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::MalformedRecord`] if a record lacks one of
    /// the layout's columns and [`ClonotrackError::InvalidNumber`] if an
    /// insertion field is not an integer.
    pub fn run(dataset: &Dataset, layout: ColumnLayout) -> Result<Self, ClonotrackError> {
        #[cfg(feature = "tracing")]
        let _span = info_span!("epitope_analysis", sources = dataset.len()).entered();

        let occurrence = count(
            dataset.records(),
            |r| r.field(layout.amino_acid),
            OccurrenceMode::PerSource {
                frame_column: layout.frame,
            },
        )?;

        let mut nucleotide_records: FxHashMap<String, u32> = FxHashMap::default();
        let mut insertions: FxHashMap<String, FirstInsertion> = FxHashMap::default();

        for (_source, table) in dataset.sources() {
            #[cfg(feature = "tracing")]
            debug!(path = ?table.path(), "Tallying source");

            for record in table.records() {
                let amino_acid = record.field(layout.amino_acid)?;
                if record.field(layout.frame)? != IN_FRAME || !is_productive(amino_acid) {
                    continue;
                }
                let nucleotide = record.field(layout.nucleotide)?;
                if !insertions.contains_key(nucleotide) {
                    insertions.insert(
                        nucleotide.to_string(),
                        FirstInsertion {
                            amino_acid: amino_acid.to_string(),
                            n1: record.numeric_field(layout.n1_insertions)?,
                            n2: record.numeric_field(layout.n2_insertions)?,
                        },
                    );
                }
                *nucleotide_records.entry(amino_acid.to_string()).or_insert(0) += 1;
            }
        }

        #[cfg(feature = "tracing")]
        info!(
            clonotypes = occurrence.len(),
            nucleotide_sequences = insertions.len(),
            "Epitope tallies complete"
        );

        Ok(Self {
            occurrence,
            nucleotide_records,
            insertions,
        })
    }

    /// Per-source occurrence counts of the amino-acid sequences.
    #[must_use]
    pub fn occurrence(&self) -> &FrequencyMap {
        &self.occurrence
    }

    /// Category of an amino-acid sequence.
    #[must_use]
    pub fn classification(&self, amino_acid: &str) -> Classification {
        Classification::from_count(self.occurrence.get_or_default(amino_acid))
    }

    /// Routes every distinct amino-acid and nucleotide sequence into its
    /// category exactly once.
    #[must_use]
    pub fn classify(&self) -> Classified {
        let mut classified = Classified::default();

        let mut amino_acids: Vec<_> = self.nucleotide_records.iter().collect();
        amino_acids.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (amino_acid, records) in amino_acids {
            classified
                .category_mut(self.classification(amino_acid))
                .amino_acids
                .push(AminoAcidRow {
                    amino_acid: amino_acid.clone(),
                    nucleotide_records: *records,
                    glycines: glycine_count(amino_acid),
                });
        }

        let mut nucleotides: Vec<_> = self.insertions.iter().collect();
        nucleotides.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (nucleotide, first) in nucleotides {
            classified
                .category_mut(self.classification(&first.amino_acid))
                .insertions
                .push(InsertionRow {
                    nucleotide: nucleotide.clone(),
                    amino_acid: first.amino_acid.clone(),
                    n1: first.n1,
                    n2: first.n2,
                });
        }

        #[cfg(feature = "tracing")]
        info!(
            private = classified.private.amino_acids.len(),
            public = classified.public.amino_acids.len(),
            "Classification complete"
        );

        classified
    }
}
