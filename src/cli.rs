//! CLI argument parsing for the ecoroute-worker binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ecoroute-worker", about = "EcoRoute route optimization worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run one optimization request from a JSON file and print the response
    Optimize {
        /// Path to a JSON file containing the request payload
        #[arg(long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["ecoroute-worker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_serve_command_parses() {
        let cli = Cli::parse_from(["ecoroute-worker", "serve"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_optimize_command_parses() {
        let cli = Cli::parse_from(["ecoroute-worker", "optimize", "--file", "trip.json"]);
        match cli.command {
            Some(Command::Optimize { file }) => {
                assert_eq!(file, PathBuf::from("trip.json"));
            }
            _ => panic!("expected optimize subcommand"),
        }
    }
}
