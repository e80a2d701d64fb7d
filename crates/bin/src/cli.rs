//! CLI argument definitions for the Amalgam binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Amalgam document tool
#[derive(Parser, Debug)]
#[command(name = "amalgam")]
#[command(about = "Amalgam: create, inspect and merge replicated documents")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human", env = "AMALGAM_FORMAT")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new document file
    New(NewArgs),
    /// Print a document as JSON
    Show(FileArgs),
    /// List the changes in a document
    History(FileArgs),
    /// Print the heads of a document
    Heads(FileArgs),
    /// Merge two documents into a new file
    Merge(MergeArgs),
}

/// Arguments for the new command
#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Path of the document to create
    pub file: PathBuf,

    /// JSON object written by a deterministic seed change.
    /// Documents created with the same seed can be merged.
    #[arg(long, value_name = "JSON")]
    pub seed: Option<String>,

    /// Overwrite the file if it exists
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for commands reading a single document
#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Path of the document
    pub file: PathBuf,
}

/// Arguments for the merge command
#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// First document
    pub left: PathBuf,

    /// Second document
    pub right: PathBuf,

    /// Where to write the merged document
    #[arg(short, long, env = "AMALGAM_OUTPUT")]
    pub output: PathBuf,
}
