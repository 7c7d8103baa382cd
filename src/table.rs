//! In-memory TSV tables and multi-file datasets.
//!
//! A table is read once and kept resident so that the counting pass and the
//! filtering/classification pass see exactly the same records.

use std::{
    fmt::Debug,
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::{error::ClonotrackError, record::Record};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Extension of the per-source files that make up a dataset.
pub const TABLE_EXTENSION: &str = "tsv";

/// A header line followed by its records, in file order.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    header: String,
    records: Vec<Record>,
}

impl Table {
    /// Reads the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::TableRead`] if the file cannot be opened
    /// or read.
    pub fn from_path<P>(path: P) -> Result<Self, ClonotrackError>
    where
        P: AsRef<Path> + Debug,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClonotrackError::TableRead {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Reads a table from any buffered reader. `path` is used for error
    /// messages and as the table's identity.
    ///
    /// Blank lines after the header are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::TableRead`] on I/O failure or invalid UTF-8.
    pub fn from_reader<R: BufRead>(
        mut reader: R,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ClonotrackError> {
        let path = path.into();
        let read_err = |source| ClonotrackError::TableRead {
            source,
            path: path.clone(),
        };

        let mut header = String::new();
        reader.read_line(&mut header).map_err(read_err)?;

        let mut records = Vec::new();
        let mut line_no = 1;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).map_err(read_err)? == 0 {
                break;
            }
            line_no += 1;
            if line.trim_end_matches(['\n', '\r']).is_empty() {
                continue;
            }
            records.push(Record::parse(line_no, line));
        }

        #[cfg(feature = "tracing")]
        debug!(path = ?path, records = records.len(), "Read table");

        Ok(Self {
            path,
            header,
            records,
        })
    }

    /// Path the table was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header line exactly as read, terminator included.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Records in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

/// Identity of one source file within a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

/// Tables read from every source of a multi-file dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Dataset {
    /// Builds a dataset from already-read tables. Each table is its own source.
    #[must_use]
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Reads every `.tsv` file directly inside `folder`, in path order.
    ///
    /// # Errors
    ///
    /// Returns [`ClonotrackError::TableRead`] if the folder or a file cannot
    /// be read, and [`ClonotrackError::EmptyDataset`] if no `.tsv` file exists.
    pub fn from_folder<P>(folder: P) -> Result<Self, ClonotrackError>
    where
        P: AsRef<Path> + Debug,
    {
        let sources = discover_sources(&folder)?;
        if sources.is_empty() {
            return Err(ClonotrackError::EmptyDataset {
                path: folder.as_ref().to_path_buf(),
            });
        }
        let tables = sources
            .iter()
            .map(Table::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tables))
    }

    /// Number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if the dataset has no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables with their source identity.
    pub fn sources(&self) -> impl Iterator<Item = (SourceId, &Table)> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, table)| (SourceId(i), table))
    }

    /// Every record of every source, tagged with its source.
    pub fn records(&self) -> impl Iterator<Item = (SourceId, &Record)> {
        self.sources()
            .flat_map(|(id, table)| table.records().iter().map(move |r| (id, r)))
    }
}

/// Lists the `.tsv` files directly inside `folder`, sorted by path.
///
/// # Errors
///
/// Returns [`ClonotrackError::TableRead`] if the folder cannot be listed.
pub fn discover_sources<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>, ClonotrackError> {
    let folder = folder.as_ref();
    let list_err = |source| ClonotrackError::TableRead {
        source,
        path: folder.to_path_buf(),
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(folder).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TABLE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
