// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Parse command - show how a command string is split into stages

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use super::OutputFormat;
use crate::pipeline::PipelineSpec;
use crate::utils::colors;

/// Print the stages `command` resolves to
pub async fn run(command: String, format: OutputFormat, directory: Option<PathBuf>) -> Result<()> {
    let mut spec = PipelineSpec::command(command);
    if let Some(dir) = directory {
        spec = spec.dir(dir);
    }

    let pipeline = spec.build()?;

    match format {
        OutputFormat::Text => colors::print_stages(pipeline.stages()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(pipeline.stages()).into_diagnostic()?;
            println!("{}", json);
        }
    }

    Ok(())
}
