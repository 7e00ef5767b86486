use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docpatch",
    about = "Compute minimal patch mutations between two JSON documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the mutations that turn document A into document B
    Diff(DiffArgs),
    /// Check that a document only uses supported names and shapes
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Original document (JSON)
    pub a: PathBuf,
    /// Updated document (JSON)
    pub b: PathBuf,
    /// Target document id; defaults to the shared `_id`
    #[arg(long)]
    pub id: Option<String>,
    /// Only apply if the document is at this revision
    #[arg(long, conflicts_with = "infer_revision")]
    pub if_revision: Option<String>,
    /// Guard with document A's `_rev`
    #[arg(long)]
    pub infer_revision: bool,
    /// Location of both trees inside the document, as a JSON array
    #[arg(long)]
    pub base_path: Option<String>,
    /// Always replace strings whole
    #[arg(long)]
    pub no_text_patch: bool,
    /// Option file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Suppress warnings
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Document to check (JSON)
    pub file: PathBuf,
}
