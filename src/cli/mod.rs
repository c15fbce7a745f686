// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for procpipe.

pub mod parse;
pub mod run;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run shell-style pipelines without a shell
#[derive(Parser, Debug)]
#[clap(
    name = "procpipe",
    version,
    about = "Run shell-style command pipelines as chained sub-processes",
    long_about = None,
    after_help = "Examples:\n\
        procpipe run 'ls -l | wc -l'              Count directory entries\n\
        procpipe run -e NAME=x 'echo $NAME'       Run with an explicit environment\n\
        procpipe parse 'cat f | sort -u'          Show how a command is split\n\n\
        See 'procpipe <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Run the pipeline in this directory
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline and print its output
    Run {
        /// Command string, e.g. "ps aux | grep ssh"
        #[clap(required_unless_present = "config")]
        command: Option<String>,

        /// Environment variable for the stages (replaces the ambient env)
        #[clap(short, long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,

        /// Start from the ambient environment when --env is given
        #[clap(long)]
        inherit_env: bool,

        /// Prefix every output line
        #[clap(short, long)]
        prefix: Option<String>,

        /// Connect the first stage to this process's stdin
        #[clap(long)]
        stdin: bool,

        /// Load the pipeline from a YAML, TOML or JSON file
        #[clap(long, conflicts_with = "command", value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show the stages a command string resolves to
    Parse {
        /// Command string
        command: String,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for the parse command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::parse_from([
            "procpipe", "-C", "/tmp", "run", "-e", "A=1", "--env", "B=2", "echo $A",
        ]);

        assert_eq!(cli.directory, Some(PathBuf::from("/tmp")));
        match cli.command {
            Commands::Run { command, env, .. } => {
                assert_eq!(command.as_deref(), Some("echo $A"));
                assert_eq!(env, vec!["A=1", "B=2"]);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_requires_command_or_config() {
        assert!(Cli::try_parse_from(["procpipe", "run"]).is_err());
        assert!(Cli::try_parse_from(["procpipe", "run", "--config", "p.yaml"]).is_ok());
    }

    #[test]
    fn test_parse_format() {
        let cli = Cli::parse_from(["procpipe", "parse", "-f", "json", "ls"]);
        assert!(matches!(
            cli.command,
            Commands::Parse {
                format: OutputFormat::Json,
                ..
            }
        ));
    }
}
