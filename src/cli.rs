// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `automan`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "automan",
    version,
    about = "Discover folder-based automation scripts and run them.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `automan.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Automations root directory; overrides `[automations].root`.
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AUTOMAN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List discovered automations.
    List,

    /// Show one automation and its declared inputs.
    Show {
        /// Automation id (its directory name).
        id: String,
    },

    /// Check inputs without running anything.
    Validate {
        id: String,

        /// Input value as `ID=VALUE`; may be repeated.
        #[arg(short, long = "input", value_name = "ID=VALUE", value_parser = parse_input)]
        inputs: Vec<(String, String)>,
    },

    /// Run an automation and print its output.
    Run {
        id: String,

        /// Input value as `ID=VALUE`; may be repeated.
        #[arg(short, long = "input", value_name = "ID=VALUE", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Run as a tracked background execution and wait for its callback.
        #[arg(long)]
        background: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_input(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected ID=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_input("cfg=/tmp/a=b.json"),
            Ok(("cfg".to_string(), "/tmp/a=b.json".to_string()))
        );
        assert_eq!(parse_input("out="), Ok(("out".to_string(), String::new())));
        assert!(parse_input("=x").is_err());
        assert!(parse_input("novalue").is_err());
    }

    #[test]
    fn run_subcommand_parses() {
        let args = CliArgs::try_parse_from([
            "automan", "--root", "autos", "run", "backup", "-i", "src=/data", "--background",
        ])
        .unwrap();

        assert_eq!(args.root, Some(PathBuf::from("autos")));
        match args.command {
            Command::Run { id, inputs, background } => {
                assert_eq!(id, "backup");
                assert_eq!(inputs, [("src".to_string(), "/data".to_string())]);
                assert!(background);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
