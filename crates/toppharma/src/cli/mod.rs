//! Command-line interface for toppharma.
//!
//! This module provides the CLI structure for the `toppharma` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DbCommand, ServeCommand, StatusCommand};

/// toppharma - Directory of pharmaceutical companies, products and websites
///
/// Serves the directory as a JSON API and manages its database.
#[derive(Debug, Parser)]
#[command(name = "toppharma")]
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
    /// Run the HTTP API server
    Serve(ServeCommand),

    /// Show database and data source status
    Status(StatusCommand),

    /// Manage the directory database
    #[command(subcommand)]
    Db(DbCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "toppharma");
    }

    #[test]
    fn test_verbosity() {
        use crate::logging::Verbosity;

        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["toppharma", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve(ServeCommand { addr: None })));

        let cli = Cli::try_parse_from(["toppharma", "serve", "--addr", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => assert_eq!(cmd.addr.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_db() {
        let cli = Cli::try_parse_from(["toppharma", "db", "seed"]).unwrap();
        assert!(matches!(cli.command, Command::Db(DbCommand::Seed)));

        let cli = Cli::try_parse_from(["toppharma", "db", "check", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Db(DbCommand::Check { json: true })));

        assert!(Cli::try_parse_from(["toppharma", "db"]).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["toppharma", "config", "validate", "--file", "/tmp/c.toml"])
                .unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Validate { file }) => {
                assert_eq!(file, Some(PathBuf::from("/tmp/c.toml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["toppharma", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["toppharma", "status", "-vv", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));

        let cli = Cli::try_parse_from(["toppharma", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
