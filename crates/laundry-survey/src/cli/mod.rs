//! Command-line interface for laundry-survey.
//!
//! This module provides the CLI structure and command handlers for the
//! `lsurvey` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ExportCommand, ListCommand, OutputFormat, StatusCommand, SubmitCommand,
    YesNoArg,
};

/// lsurvey - Laundry establishment survey
///
/// Record establishments visited during a laundry-services survey, browse
/// the collected entries, and export them to Excel.
#[derive(Debug, Parser)]
#[command(name = "lsurvey")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show backend and storage status
    Status(StatusCommand),

    /// Submit one survey entry
    Submit(Box<SubmitCommand>),

    /// Browse entries as a paged grid
    List(ListCommand),

    /// Export every entry to an Excel workbook
    Export(ExportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
