//! Output files.
//!
//! Every file is written to a temporary file in its destination directory and
//! moved into place only once complete, so a failed run never leaves a
//! half-written table behind for downstream tools.

use std::{
    fmt::Debug,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    classify::{CategoryStats, Classification, Classified, InsertionFormula},
    error::ClonotrackError,
};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Header of the nucleotide-diversity tables.
pub const NT_HEADER: &str = "AA_SEQ\tNUM_NT";
/// Header of the insertion tables.
pub const INS_HEADER: &str = "DNA_SEQ\tAA_SEQ\tNUM_INS";
/// Header of the glycine tables.
pub const GLY_HEADER: &str = "AA_SEQ\tNUM_GLY";

/// A file that only appears at its destination after [`commit`](Self::commit).
///
/// Dropping an uncommitted `AtomicFile` removes the temporary file.
pub struct AtomicFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    /// Creates a temporary file next to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::WriteError`] if the temporary file cannot
    /// be created.
    pub fn create<P>(target: P) -> Result<Self, ClonotrackError>
    where
        P: AsRef<Path> + Debug,
    {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            target,
            writer: BufWriter::new(tmp),
        })
    }

    /// Flushes and moves the file to its destination.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::WriteError`] if flushing fails and
    /// [`ClonotrackError::Persist`] if the file cannot be moved into place.
    pub fn commit(self) -> Result<PathBuf, ClonotrackError> {
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| ClonotrackError::WriteError {
                source: e.into_error(),
            })?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.target)
            .map_err(|e| ClonotrackError::Persist {
                source: e.error,
                path: self.target.clone(),
            })?;

        #[cfg(feature = "tracing")]
        debug!(path = ?self.target, "Wrote output");

        Ok(self.target)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Writes `contents` to `target` atomically.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or persisted,
/// or if `contents` fails.
pub fn write_atomically<P, F>(target: P, contents: F) -> Result<PathBuf, ClonotrackError>
where
    P: AsRef<Path> + Debug,
    F: FnOnce(&mut AtomicFile) -> Result<(), ClonotrackError>,
{
    let mut file = AtomicFile::create(target)?;
    contents(&mut file)?;
    file.commit()
}

/// The per-category statistic tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTable {
    /// Nucleotide records per amino-acid sequence.
    Nucleotide,
    /// Insertions per nucleotide sequence.
    Insertion,
    /// Glycines per amino-acid sequence.
    Glycine,
}

impl StatTable {
    /// All tables, in the order they are written.
    pub const ALL: [StatTable; 3] = [Self::Nucleotide, Self::Insertion, Self::Glycine];

    fn suffix(self) -> &'static str {
        match self {
            Self::Nucleotide => "nt",
            Self::Insertion => "ins",
            Self::Glycine => "gly",
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::Nucleotide => NT_HEADER,
            Self::Insertion => INS_HEADER,
            Self::Glycine => GLY_HEADER,
        }
    }
}

/// Path of one output table: `{prefix}_{category}_{table}.txt`.
///
/// ```rust
/// use clonotrack::classify::Classification;
/// use clonotrack::output::{stat_table_path, StatTable};
/// use std::path::{Path, PathBuf};
///
/// let path = stat_table_path(Path::new("runs/NAI/"), Classification::Public, StatTable::Glycine);
/// assert_eq!(path, PathBuf::from("runs/NAI_public_gly.txt"));
/// ```
#[must_use]
pub fn stat_table_path(prefix: &Path, class: Classification, table: StatTable) -> PathBuf {
    let prefix = prefix.to_string_lossy();
    let trimmed = prefix
        .trim_end_matches(std::path::MAIN_SEPARATOR)
        .trim_end_matches('/');
    let prefix = if trimmed.is_empty() { &*prefix } else { trimmed };
    PathBuf::from(format!("{prefix}_{class}_{}.txt", table.suffix()))
}

/// Writes one statistic table of one category, header first.
///
/// # Errors
///
/// Returns [`ClonotrackError::WriteError`] if the writer fails.
pub fn write_stat_table<W: Write>(
    writer: &mut W,
    stats: &CategoryStats,
    table: StatTable,
    formula: InsertionFormula,
) -> Result<(), ClonotrackError> {
    writeln!(writer, "{}", table.header())?;
    match table {
        StatTable::Nucleotide => {
            for row in &stats.amino_acids {
                writeln!(writer, "{}\t{}", row.amino_acid, row.nucleotide_records)?;
            }
        }
        StatTable::Glycine => {
            for row in &stats.amino_acids {
                writeln!(writer, "{}\t{}", row.amino_acid, row.glycines)?;
            }
        }
        StatTable::Insertion => {
            for row in &stats.insertions {
                writeln!(
                    writer,
                    "{}\t{}\t{}",
                    row.nucleotide,
                    row.amino_acid,
                    row.insertions(formula)
                )?;
            }
        }
    }
    Ok(())
}

/// Writes all six statistic tables next to `prefix`.
///
/// Every table is fully written to its temporary file before any of them is
/// moved into place. The moves themselves happen one after another: if a
/// later one fails, the tables already moved stay in place next to older
/// versions of the rest.
///
/// # Errors
///
/// Returns an error if any table cannot be written or persisted.
pub fn write_classified(
    prefix: &Path,
    classified: &Classified,
    formula: InsertionFormula,
) -> Result<Vec<PathBuf>, ClonotrackError> {
    let mut pending = Vec::with_capacity(6);
    for class in [Classification::Private, Classification::Public] {
        for table in StatTable::ALL {
            let mut file = AtomicFile::create(stat_table_path(prefix, class, table))?;
            write_stat_table(&mut file, classified.category(class), table, formula)?;
            pending.push(file);
        }
    }
    pending.into_iter().map(AtomicFile::commit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{AminoAcidRow, InsertionRow};
    use std::fs;

    fn stats() -> CategoryStats {
        CategoryStats {
            amino_acids: vec![AminoAcidRow {
                amino_acid: "GAGY".to_string(),
                nucleotide_records: 3,
                glycines: 2,
            }],
            insertions: vec![InsertionRow {
                nucleotide: "GGTGCT".to_string(),
                amino_acid: "GAGY".to_string(),
                n1: 1,
                n2: 2,
            }],
        }
    }

    fn render(table: StatTable, formula: InsertionFormula) -> String {
        let mut out = Vec::new();
        write_stat_table(&mut out, &stats(), table, formula).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn stat_tables() {
        insta::assert_snapshot!(
            format!("{:?}", render(StatTable::Nucleotide, InsertionFormula::Sum)),
            @r###""AA_SEQ\tNUM_NT\nGAGY\t3\n""###
        );
        insta::assert_snapshot!(
            format!("{:?}", render(StatTable::Glycine, InsertionFormula::Sum)),
            @r###""AA_SEQ\tNUM_GLY\nGAGY\t2\n""###
        );
        insta::assert_snapshot!(
            format!("{:?}", render(StatTable::Insertion, InsertionFormula::DoubledN1)),
            @r###""DNA_SEQ\tAA_SEQ\tNUM_INS\nGGTGCT\tGAGY\t2\n""###
        );
    }

    #[test]
    fn table_path_without_trailing_separator() {
        let path = stat_table_path(Path::new("NAI"), Classification::Private, StatTable::Nucleotide);
        assert_eq!(path, PathBuf::from("NAI_private_nt.txt"));
    }

    #[test]
    fn root_prefix_is_kept() {
        let path = stat_table_path(Path::new("/"), Classification::Private, StatTable::Nucleotide);
        assert_eq!(path, PathBuf::from("/_private_nt.txt"));
    }

    #[test]
    fn atomic_file_appears_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.tsv");
        let mut file = AtomicFile::create(&target).unwrap();
        file.write_all(b"hello\n").unwrap();
        assert!(!target.exists());
        file.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello\n");
    }

    #[test]
    fn failed_contents_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.tsv");
        let result = write_atomically(&target, |f| {
            f.write_all(b"partial")?;
            Err(ClonotrackError::MissingQuality {
                id: "traX".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_classified_creates_six_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("NAI");
        let classified = Classified {
            private: CategoryStats::default(),
            public: stats(),
        };
        let written = write_classified(&prefix, &classified, InsertionFormula::Sum).unwrap();
        assert_eq!(written.len(), 6);
        let public_ins = fs::read_to_string(dir.path().join("NAI_public_ins.txt")).unwrap();
        assert_eq!(public_ins, "DNA_SEQ\tAA_SEQ\tNUM_INS\nGGTGCT\tGAGY\t3\n");
        let private_nt = fs::read_to_string(dir.path().join("NAI_private_nt.txt")).unwrap();
        assert_eq!(private_nt, "AA_SEQ\tNUM_NT\n");
    }
}
