//! CLI module for oracle-agent
//!
//! This module provides the command-line interface using clap derive macros.

pub mod args;
pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_ENV;
use args::{ConfigArgs, KeygenArgs, ListArgs, ServeArgs, SignArgs};

/// SSH agent acting as an Ed25519 signing oracle
#[derive(Parser, Debug)]
#[command(name = "oracle-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve private keys on a Unix socket until interrupted
    Serve(ServeArgs),

    /// Generate an unencrypted Ed25519 private key file
    Keygen(KeygenArgs),

    /// List the identities of a running agent
    List(ListArgs),

    /// Sign data through a running agent
    Sign(SignArgs),

    /// Show or validate configuration
    Config(ConfigArgs),

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "oracle-agent",
            "serve",
            "-k",
            "/keys/a",
            "-k",
            "/keys/b",
            "--socket",
            "/tmp/a.sock",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.key_files.len(), 2);
                assert_eq!(args.socket, Some(PathBuf::from("/tmp/a.sock")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["oracle-agent", "--verbose", "--quiet", "version"]).is_err());
    }

    #[test]
    fn test_log_format_values() {
        assert!(Cli::try_parse_from(["oracle-agent", "--log-format", "json", "version"]).is_ok());
        assert!(Cli::try_parse_from(["oracle-agent", "--log-format", "xml", "version"]).is_err());
    }
}
