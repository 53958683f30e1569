//! Command-line interface definitions for dupesift.
//!
//! Global options (verbosity, color, config file) plus one subcommand per
//! step of the workflow: scan a tree into a table, inspect it, adjust the
//! delete flags, then execute the deletions.
//!
//! # Example
//!
//! ```bash
//! # Group near-duplicate photos and write file_list.csv
//! dupesift scan ~/Pictures
//!
//! # Keep copies in ./originals first, then ./edits
//! dupesift priority ./originals ./edits
//!
//! # Review, then move marked files to the trash
//! dupesift status
//! dupesift delete --dry-run
//! dupesift delete -y
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scanner::PerceptualAlgorithm;

/// Near-duplicate media grouping with folder-priority resolution.
///
/// dupesift fingerprints images perceptually, groups files whose fingerprints
/// are close, and decides which copy to keep from a ranked list of folders.
#[derive(Debug, Parser)]
#[command(name = "dupesift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory, group near-duplicates and write the table
    Scan(ScanArgs),
    /// Show group statuses and reclaimable space
    Status(StatusArgs),
    /// Set or clear the delete flag of one file
    Mark(MarkArgs),
    /// Keep one file per group according to a folder priority list
    Priority(PriorityArgs),
    /// Delete every file marked for deletion
    Delete(DeleteArgs),
    /// Show the configuration file location and effective settings
    Config,
}

/// Location of the persisted table, shared by the commands that read it.
#[derive(Debug, Args)]
pub struct TableArg {
    /// Table written by `scan` (defaults to `table_path` from config)
    #[arg(short, long, value_name = "TABLE")]
    pub table: Option<PathBuf>,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Where to write the table
    #[arg(short, long, value_name = "TABLE")]
    pub output: Option<PathBuf>,

    /// Maximum fingerprint distance, exclusive (defaults per algorithm)
    #[arg(long, value_name = "N")]
    pub threshold: Option<u32>,

    /// Perceptual hash algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<PerceptualAlgorithm>,

    /// Do not write a blank row between grouped and single files
    #[arg(long)]
    pub no_separator: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Number of threads for fingerprinting
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub table: TableArg,

    /// Print a JSON report instead of the summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the mark subcommand.
#[derive(Debug, Args)]
pub struct MarkArgs {
    #[command(flatten)]
    pub table: TableArg,

    /// Full path of the file, as it appears in the table
    #[arg(value_name = "FILE_PATH")]
    pub file_path: String,

    /// Mark the file for deletion
    #[arg(long, conflicts_with = "keep", required_unless_present = "keep")]
    pub delete: bool,

    /// Clear the delete flag
    #[arg(long)]
    pub keep: bool,
}

/// Arguments for the priority subcommand.
#[derive(Debug, Args)]
pub struct PriorityArgs {
    #[command(flatten)]
    pub table: TableArg,

    /// Directories in order of preference, as shown in the Directory Path column
    #[arg(value_name = "DIR")]
    pub folders: Vec<String>,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub table: TableArg,

    /// Use permanent deletion instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long)]
    pub permanent: bool,

    /// Report what would be deleted without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt (required with --permanent in non-interactive mode)
    #[arg(short = 'y', long)]
    pub yes: bool,
}
