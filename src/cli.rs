use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crate::import::ImportOptions;

/// Extension given to the database when no output path is passed
pub const DEFAULT_EXTENSION: &str = "sqlite3";

#[derive(Parser, Debug)]
#[command(name = "r6-stats-to-sqlite")]
#[command(version, about = "Normalize R6 statistics exports into a SQLite star schema")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a `;`-separated statistics export into a new database
    Import(ImportArgs),

    /// List all table names in dependency order
    ListTables,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Statistics export (CSV, `;` separated, Latin-1)
    pub input: PathBuf,

    /// Output SQLite database path [default: INPUT with a .sqlite3 extension]
    pub output: Option<PathBuf>,

    /// Overwrite the output database if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Skip malformed rows instead of aborting the import
    #[arg(short, long)]
    pub skip_malformed: bool,

    /// Show the full-screen progress view
    #[arg(long)]
    pub tui: bool,

    /// Print the import summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output(&self.input))
    }

    /// Check the input exists and the output may be written; returns the
    /// output path
    pub fn validate(&self) -> Result<PathBuf> {
        if !self.input.is_file() {
            bail!("Input file {:?} does not exist", self.input);
        }

        let output = self.output_path();
        if output.exists() && same_file(&self.input, &output)? {
            bail!(
                "Output {:?} is the input file, pass a different OUTPUT path",
                output
            );
        }
        if output.exists() && !self.force {
            bail!(
                "Output {:?} already exists, use --force to overwrite it",
                output
            );
        }

        Ok(output)
    }

    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            skip_malformed: self.skip_malformed,
        }
    }
}

/// Whether two existing paths resolve to the same file
fn same_file(a: &Path, b: &Path) -> Result<bool> {
    let a = fs::canonicalize(a).with_context(|| format!("Failed to resolve {:?}", a))?;
    let b = fs::canonicalize(b).with_context(|| format!("Failed to resolve {:?}", b))?;
    Ok(a == b)
}

/// Input path with its extension replaced
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension(DEFAULT_EXTENSION)
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
