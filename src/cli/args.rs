//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, export::ExportArgs, import::ImportArgs,
    init::InitArgs, list::ListArgs, mapping::MappingArgs, tag::TagArgs, template::TemplateArgs,
};
use crate::entities::RecordType;

#[derive(Parser)]
#[command(name = "vct")]
#[command(author, version, about = "Bulk CSV import/export for game-reference content")]
#[command(long_about = "Imports spreadsheet rows into a content workspace with a preview, validation and \
row-by-row import, and exports stored records as CSV, JSON or spreadsheet files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .vct/)
    #[arg(long, global = true, env = "VCT_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new content workspace
    Init(InitArgs),

    /// Preview, validate and import rows from a CSV file
    Import(ImportArgs),

    /// Export stored records as CSV, JSON or spreadsheet
    Export(ExportArgs),

    /// Print a CSV template for a record type
    Template(TemplateArgs),

    /// Show the field mapping for a record type
    Mapping(MappingArgs),

    /// List stored records
    List(ListArgs),

    /// Add or remove tags on a stored record
    Tag(TagArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Value parser for record type arguments
pub fn parse_record_type(s: &str) -> Result<RecordType, String> {
    s.parse()
}
