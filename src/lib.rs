// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! # procpipe - shell-style pipelines without a shell
//!
//! `procpipe` takes a command string such as `ps aux | grep ssh | wc -l`,
//! splits it into stages, connects each stage's stdout to the next stage's
//! stdin, and buffers the last stage's stdout and stderr line by line.
//!
//! ## Features
//!
//! - **Quoting** - single quotes, double quotes and backslash escapes
//! - **Variables** - `$NAME` / `${NAME}` from the process env or an override map
//! - **Line handlers** - transform each output line before it is buffered
//! - **Clean failure** - stages that started before a failed launch are reaped
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn demo() -> procpipe::PipeResult<()> {
//! use procpipe::PipelineSpec;
//!
//! let mut pipeline = PipelineSpec::command("printf 'b\\na\\n' | sort")
//!     .line_handler(|line| format!("{line}\n"))
//!     .build()?;
//!
//! let output = pipeline.run().await?;
//! assert_eq!(output, "a\nb\n");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod command;
pub mod env;
pub mod errors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use env::EnvPolicy;
pub use errors::{ParseError, PipeError, PipeResult};
pub use pipeline::{LineHandler, Pipeline, PipelineConfig, PipelineSpec, PipelineState, StageSpec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
