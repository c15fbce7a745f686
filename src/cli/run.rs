// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Run command - execute a pipeline and print its output

use miette::Result;
use std::path::PathBuf;

use crate::env::{parse_env, EnvPolicy};
use crate::pipeline::{PipelineConfig, PipelineSpec};
use crate::utils::colors;

/// Options for `procpipe run`
#[derive(Debug, Default)]
pub struct RunOptions {
    pub command: Option<String>,
    pub env: Vec<String>,
    pub inherit_env: bool,
    pub prefix: Option<String>,
    pub stdin: bool,
    pub config: Option<PathBuf>,
    pub directory: Option<PathBuf>,
}

/// Run a pipeline
pub async fn run(options: RunOptions, verbose: bool) -> Result<()> {
    let mut spec = match (options.config, options.command) {
        (Some(path), _) => PipelineConfig::from_file(&path)?.into_spec()?,
        (None, Some(command)) => PipelineSpec::command(command),
        (None, None) => return Err(miette::miette!("Either a command or --config is required")),
    };

    if !options.env.is_empty() {
        let vars = parse_env(&options.env)?;
        spec = spec.env_policy(if options.inherit_env {
            EnvPolicy::inherit_with(vars)
        } else {
            EnvPolicy::Override(vars)
        });
    }

    if let Some(dir) = options.directory {
        spec = spec.dir(dir);
    }

    if options.stdin {
        spec = spec.inherit_stdin(true);
    }

    let prefix = options.prefix.unwrap_or_default();
    spec = spec.line_handler(move |line| format!("{}{}\n", prefix, line));

    let mut pipeline = spec.build()?;

    if verbose {
        colors::print_stages(pipeline.stages());
    }

    let result = pipeline.run().await;
    print!("{}", pipeline.output());

    if verbose {
        let stderr = pipeline.stderr_log();
        if !stderr.is_empty() {
            eprintln!("{}", colors::dimmed(&stderr));
        }
    }

    result.map(|_| ()).map_err(Into::into)
}
