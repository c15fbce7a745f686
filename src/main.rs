// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! procpipe - run shell-style pipelines without a shell

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procpipe::cli::run::RunOptions;
use procpipe::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for pipeline output
    let default_filter = if cli.verbose { "procpipe=debug" } else { "procpipe=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            command,
            env,
            inherit_env,
            prefix,
            stdin,
            config,
        } => {
            let options = RunOptions {
                command,
                env,
                inherit_env,
                prefix,
                stdin,
                config,
                directory: cli.directory,
            };
            procpipe::cli::run::run(options, cli.verbose).await
        }
        Commands::Parse { command, format } => {
            procpipe::cli::parse::run(command, format, cli.directory).await
        }
    }
}
