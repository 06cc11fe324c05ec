//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: revise input.md through every pass (default)
//! - check: verify prompts and input before running
//! - passes: show the pass order

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Backend;

/// redline - run a markdown document through an ordered chain of editing passes
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding agents/, input.md and the outputs
    #[arg(short = 'C', long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the document through every pass
    Run {
        /// Input document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Final output document (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Transformation backend (overrides config)
        #[arg(short, long, value_enum)]
        backend: Option<Backend>,
    },

    /// Check that every prompt file and the input exist
    Check,

    /// List the passes in pipeline order
    Passes,
}
