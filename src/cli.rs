//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::{classify::InsertionFormula, header::Chain};

/// Clonotype frequency filtering and private/public classification for
/// parsed TCR repertoires.
#[derive(Parser, Debug)]
#[command(name = "clonotrack")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log per-file progress
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep the rows of a parsed table whose clonotype occurs at least MIN_COUNT times
    Filter {
        /// Parsed TSV table with a header row
        path: PathBuf,

        /// Minimum number of rows sharing a clonotype
        #[arg(value_parser = parse_min_count)]
        min_count: u32,

        /// Chain whose CDR3 column identifies the clonotype
        #[arg(value_enum)]
        chain: Chain,

        /// Write the filtered table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify clonotypes of a folder of per-donor tables as private or public
    Analyze {
        /// Folder holding one .tsv file per donor
        folder: PathBuf,

        /// How the insertion count is derived from the N1 and N2 columns
        #[arg(short, long, value_enum, default_value = "sum")]
        insertions: InsertionFormula,

        /// Prefix of the output tables (defaults to the folder path)
        #[arg(short, long)]
        prefix: Option<PathBuf>,
    },

    /// Pair alpha and beta chains with their quality scores for TCR-dist
    Pair {
        /// FASTA file with alpha and beta reads
        fasta: PathBuf,

        /// Quality file matching the FASTA reads
        qual: PathBuf,

        /// Paired output table
        output: PathBuf,

        /// Subject written on every row
        subject: String,
    },

    /// Print clonotype counts of a parsed table
    Count {
        /// Parsed TSV table with a header row
        path: PathBuf,

        /// Chain whose CDR3 column identifies the clonotype
        #[arg(value_enum)]
        chain: Chain,

        /// Minimum count threshold (clonotypes below this are excluded)
        #[arg(short, long, default_value = "1", value_parser = parse_min_count)]
        min_count: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tsv")]
        format: OutputFormat,
    },
}

/// Output format for clonotype counts.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Tab-separated values (sequence\tcount)
    #[default]
    Tsv,
    /// JSON array format
    Json,
}

fn parse_min_count(s: &str) -> Result<u32, String> {
    let min_count: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid count"))?;
    if min_count == 0 {
        return Err("minimum count must be at least 1".to_string());
    }
    Ok(min_count)
}
