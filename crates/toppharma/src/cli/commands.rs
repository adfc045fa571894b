//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind, overriding the configured one (e.g. 0.0.0.0:8080)
    #[arg(short, long, value_name = "ADDR")]
    pub addr: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Database management commands.
#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Create the database file and schema if missing
    Init,

    /// Load the built-in demo directory into the database
    Seed,

    /// Run the connection diagnostics
    Check {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration management commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to configuration file (uses default if not specified)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
