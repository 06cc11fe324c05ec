//! CLI module for redline - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the pipeline,
//! checking prerequisites and listing passes.

pub mod commands;

pub use commands::Cli;
