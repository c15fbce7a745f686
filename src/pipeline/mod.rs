// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Pipelines of sub-processes
//!
//! This module defines the pipeline configuration, the launcher that wires
//! stages together, the concurrent reader for the terminal stage, and the
//! lifecycle API callers drive.

mod definition;
mod launcher;
mod process;
mod reader;

pub use definition::*;
pub use process::{Pipeline, PipelineState};
pub use reader::{drain_lines, OutputBuffer, Stream};
