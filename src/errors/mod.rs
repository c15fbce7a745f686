// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Error types
//!
//! Every failure in procpipe is surfaced as a [`PipeError`]. Problems with the
//! command string itself are grouped under [`ParseError`] so callers can tell
//! "this pipeline could never run" apart from "this pipeline failed to run".

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::pipeline::PipelineState;

/// Result type for procpipe operations
pub type PipeResult<T> = Result<T, PipeError>;

/// Malformed command strings and stage lists
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Command string is empty")]
    #[diagnostic(
        code(procpipe::empty_command),
        help("Provide at least one program to run, e.g. 'echo hello'")
    )]
    EmptyCommand,

    #[error("Unterminated {quote} quote starting at offset {offset}")]
    #[diagnostic(
        code(procpipe::unterminated_quote),
        help("Close the quote or escape it with a backslash")
    )]
    UnterminatedQuote { quote: char, offset: usize },

    #[error("Trailing backslash at offset {offset}")]
    #[diagnostic(
        code(procpipe::trailing_escape),
        help("A backslash must be followed by the character it escapes")
    )]
    TrailingEscape { offset: usize },

    #[error("Stage {index} of the pipeline is empty")]
    #[diagnostic(
        code(procpipe::empty_stage),
        help("Check for leading, trailing or doubled '|' separators")
    )]
    EmptyStage { index: usize },

    #[error("Pipeline has no stages")]
    #[diagnostic(code(procpipe::no_stages))]
    NoStages,

    #[error("Invalid environment entry '{entry}'")]
    #[diagnostic(
        code(procpipe::invalid_env_entry),
        help("Environment entries must look like KEY=VALUE")
    )]
    InvalidEnvEntry { entry: String },
}

/// Main error type for procpipe
#[derive(Error, Debug, Diagnostic)]
pub enum PipeError {
    // ─────────────────────────────────────────────────────────────────────────
    // Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    // ─────────────────────────────────────────────────────────────────────────
    // Process Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage {index} ('{program}') failed to start: {source}")]
    #[diagnostic(code(procpipe::launch_failed))]
    Launch {
        index: usize,
        program: String,
        #[source]
        source: io::Error,
        /// Stderr captured from the stages started before this one
        stderr: String,
        /// Number of earlier stages whose exit status was collected before returning
        reaped: usize,
        #[help]
        help: Option<String>,
    },

    #[error("'{program}' exited with {status}")]
    #[diagnostic(code(procpipe::exited))]
    Exited { program: String, status: ExitStatus },

    #[error("Failed waiting for '{program}': {source}")]
    #[diagnostic(code(procpipe::wait_failed))]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot {operation} a pipeline in state {state}")]
    #[diagnostic(
        code(procpipe::invalid_state),
        help("Pipelines go Built -> Launched -> Draining -> Completed; start() must come before wait()")
    )]
    InvalidState {
        operation: &'static str,
        state: PipelineState,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot resolve working directory: {message}")]
    #[diagnostic(code(procpipe::working_dir))]
    WorkingDir { message: String },

    #[error("Failed to read config '{path}': {error}")]
    #[diagnostic(code(procpipe::config_read))]
    ConfigRead { path: PathBuf, error: String },

    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(procpipe::invalid_config))]
    InvalidConfig { reason: String },

    #[error("Unsupported config format: {path}")]
    #[diagnostic(
        code(procpipe::unsupported_config),
        help("Supported formats: .yaml, .yml, .toml, .json")
    )]
    UnsupportedConfig { path: PathBuf },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(procpipe::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(procpipe::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(procpipe::toml_error))]
    Toml { message: String },
}

impl From<serde_yaml::Error> for PipeError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for PipeError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl PipeError {
    /// Create a launch error with a hint derived from the OS error
    pub fn launch(
        index: usize,
        program: &str,
        source: io::Error,
        stderr: String,
        reaped: usize,
    ) -> Self {
        let help = Self::generate_help_for_launch_error(program, &source);
        Self::Launch {
            index,
            program: program.to_string(),
            source,
            stderr,
            reaped,
            help,
        }
    }

    /// Index of the stage that failed to start, if this is a launch error
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Launch { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Exit status of the terminal stage, if this is an exit error
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            Self::Exited { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn generate_help_for_launch_error(program: &str, err: &io::Error) -> Option<String> {
        match err.kind() {
            io::ErrorKind::NotFound => Some(format!(
                "'{}' was not found. Check the spelling, the PATH and the working directory.",
                program
            )),
            io::ErrorKind::PermissionDenied => Some(format!(
                "'{}' is not executable by the current user.",
                program
            )),
            _ => None,
        }
    }
}
