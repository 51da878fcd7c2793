//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `generate`: Extract directives and write OpenAPI documents
//! - `init`: Initialize apiscribe configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Generate(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Documents to generate (default: every document named by an operation)
    /// Can be specified multiple times: --doc admin --doc public
    #[arg(long = "doc", value_name = "NAME")]
    pub documents: Vec<String>,

    /// Output directory (overrides config file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name of the document untargeted operations belong to
    #[arg(long, value_name = "NAME")]
    pub default_document: Option<String>,

    /// Keep every declared schema, not only the referenced ones
    #[arg(long)]
    pub no_clean: bool,

    /// Ignore and do not update the checksum cache
    #[arg(long)]
    pub no_cache: bool,

    /// Exit with status 1 when any diagnostic was reported
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate OpenAPI documents from annotated sources
    Generate(GenerateCommand),
    /// Initialize a new .apiscriberc.json configuration file
    Init,
}
