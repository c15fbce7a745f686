// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Pipeline lifecycle
//!
//! A [`Pipeline`] moves through `Built -> Launched -> Draining -> Completed`,
//! or `Built -> Failed` when a stage cannot be started. An unbuilt pipeline is
//! a [`PipelineSpec`](super::PipelineSpec).

use std::fmt;

use tracing::debug;

use super::definition::{LineHandler, StageSpec};
use super::launcher::{launch, Completion};
use super::reader::OutputBuffer;
use crate::errors::{PipeError, PipeResult};

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Stages resolved, nothing started
    Built,
    /// All stages started
    Launched,
    /// Waiting for the drains and processes to finish
    Draining,
    /// Output is final
    Completed,
    /// A stage failed to start; earlier stages were reaped
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Built => write!(f, "built"),
            Self::Launched => write!(f, "launched"),
            Self::Draining => write!(f, "draining"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A chain of sub-processes connected by pipes
pub struct Pipeline {
    stages: Vec<StageSpec>,
    line_handler: Option<LineHandler>,
    inherit_stdin: bool,
    state: PipelineState,
    output: OutputBuffer,
    errors: OutputBuffer,
    completion: Option<Completion>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(crate) fn new(
        stages: Vec<StageSpec>,
        line_handler: Option<LineHandler>,
        inherit_stdin: bool,
    ) -> Self {
        Self {
            stages,
            line_handler,
            inherit_stdin,
            state: PipelineState::Built,
            output: OutputBuffer::new(),
            errors: OutputBuffer::new(),
            completion: None,
        }
    }

    /// The resolved stages, in pipe order
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Start every stage without waiting for output.
    pub async fn start(&mut self) -> PipeResult<()> {
        if self.state != PipelineState::Built {
            return Err(PipeError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        debug!(
            command = %self.command_line(),
            "starting pipeline"
        );

        match launch(
            &self.stages,
            self.line_handler.clone(),
            self.inherit_stdin,
            &self.output,
            &self.errors,
        )
        .await
        {
            Ok(completion) => {
                self.completion = Some(completion);
                self.state = PipelineState::Launched;
                Ok(())
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// Wait for both output drains and then every stage.
    ///
    /// The result reflects only the terminal stage: a non-zero exit is
    /// reported as [`PipeError::Exited`].
    pub async fn wait(&mut self) -> PipeResult<()> {
        let Some(completion) = self.completion.take() else {
            return Err(PipeError::InvalidState {
                operation: "wait",
                state: self.state,
            });
        };

        self.state = PipelineState::Draining;
        let status = completion.wait().await;
        self.state = PipelineState::Completed;

        let status = status?;
        debug!(%status, "pipeline completed");

        if status.success() {
            Ok(())
        } else {
            let program = self
                .stages
                .last()
                .map(|s| s.program.clone())
                .unwrap_or_default();
            Err(PipeError::Exited { program, status })
        }
    }

    /// Start, wait, and return the buffered output.
    ///
    /// On a non-zero exit the error is returned and whatever was buffered
    /// stays available through [`Pipeline::output`].
    pub async fn run(&mut self) -> PipeResult<String> {
        self.start().await?;
        self.wait().await?;
        Ok(self.output())
    }

    /// Buffered output of the terminal stage.
    ///
    /// Only complete once [`Pipeline::wait`] or [`Pipeline::run`] returned.
    pub fn output(&self) -> String {
        self.output.contents()
    }

    /// Raw stderr of every non-terminal stage
    pub fn stderr_log(&self) -> String {
        self.errors.contents()
    }

    fn command_line(&self) -> String {
        self.stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineSpec;

    #[tokio::test]
    async fn test_state_transitions() {
        let mut pipeline = PipelineSpec::command("echo hi").build().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Built);

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Launched);

        pipeline.wait().await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Completed);
        assert_eq!(pipeline.output(), "hi");
    }

    #[tokio::test]
    async fn test_wait_before_start_is_rejected() {
        let mut pipeline = PipelineSpec::command("echo hi").build().unwrap();
        let err = pipeline.wait().await.unwrap_err();
        assert!(matches!(
            err,
            PipeError::InvalidState {
                operation: "wait",
                state: PipelineState::Built
            }
        ));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let mut pipeline = PipelineSpec::command("true").build().unwrap();
        pipeline.start().await.unwrap();
        assert!(matches!(
            pipeline.start().await,
            Err(PipeError::InvalidState { operation: "start", .. })
        ));
        pipeline.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_start_moves_to_failed() {
        let mut pipeline = PipelineSpec::command("/nonexistent/procpipe-test-binary")
            .build()
            .unwrap();
        let err = pipeline.start().await.unwrap_err();

        assert_eq!(err.stage_index(), Some(0));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(matches!(
            pipeline.wait().await,
            Err(PipeError::InvalidState { state: PipelineState::Failed, .. })
        ));
    }

    #[test]
    fn test_command_line() {
        let pipeline = PipelineSpec::command("ls -l | wc -l").build().unwrap();
        assert_eq!(pipeline.command_line(), "ls -l | wc -l");
    }
}
