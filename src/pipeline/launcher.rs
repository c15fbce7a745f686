// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Pipe wiring and process launch
//!
//! Stages are started in order. Each non-terminal stage's stdout becomes the
//! next stage's stdin and its stderr is copied into the shared error buffer;
//! the terminal stage's stdout and stderr are handed to the line reader.
//!
//! If any stage fails to start, every stage started before it is waited on
//! before the launch error is returned.

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::definition::{LineHandler, StageSpec};
use super::reader::{spawn_collect, spawn_drain, OutputBuffer, Stream};
use crate::errors::{ParseError, PipeError, PipeResult};

/// A started stage
struct RunningStage {
    index: usize,
    program: String,
    child: Child,
}

impl RunningStage {
    async fn wait(mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait().await;
        match &status {
            Ok(status) => debug!(stage = self.index, program = %self.program, %status, "stage exited"),
            Err(e) => warn!(stage = self.index, program = %self.program, error = %e, "wait failed"),
        }
        status
    }
}

/// Stages started so far, plus their stderr collectors.
///
/// Dropping this without calling [`StartedStages::reap`] or
/// [`StartedStages::into_completion`] hands the children to a background
/// task that waits on them.
#[derive(Default)]
struct StartedStages {
    stages: Vec<RunningStage>,
    collectors: Vec<JoinHandle<()>>,
}

impl StartedStages {
    fn push(&mut self, index: usize, spec: &StageSpec, child: Child) {
        debug!(stage = index, program = %spec.program, pid = ?child.id(), "started stage");
        self.stages.push(RunningStage {
            index,
            program: spec.program.clone(),
            child,
        });
    }

    /// Wait on every started stage. Returns how many reported an exit status.
    async fn reap(mut self) -> usize {
        let mut reaped = 0;

        for stage in std::mem::take(&mut self.stages) {
            if stage.wait().await.is_ok() {
                reaped += 1;
            }
        }
        for collector in std::mem::take(&mut self.collectors) {
            let _ = collector.await;
        }

        reaped
    }

    fn into_completion(mut self, drains: [JoinHandle<()>; 2]) -> Completion {
        Completion {
            drains,
            stages: std::mem::take(&mut self.stages),
            collectors: std::mem::take(&mut self.collectors),
        }
    }
}

impl Drop for StartedStages {
    fn drop(&mut self) {
        if self.stages.is_empty() {
            return;
        }

        let stages = std::mem::take(&mut self.stages);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for stage in stages {
                        let _ = stage.wait().await;
                    }
                });
            }
            Err(_) => warn!(count = stages.len(), "dropping started stages outside a runtime"),
        }
    }
}

/// Composite completion of a launched pipeline: both drain tasks, the
/// terminal stage's exit, and the reaping of every earlier stage.
pub(crate) struct Completion {
    /// stdout and stderr drains of the terminal stage
    drains: [JoinHandle<()>; 2],
    /// All stages in order; the last one is terminal
    stages: Vec<RunningStage>,
    collectors: Vec<JoinHandle<()>>,
}

impl Completion {
    /// Wait for both drains, then the terminal stage, then the rest.
    ///
    /// Returns the terminal stage's exit status.
    pub(crate) async fn wait(self) -> PipeResult<ExitStatus> {
        let Completion {
            drains: [stdout, stderr],
            mut stages,
            collectors,
        } = self;

        let (stdout, stderr) = tokio::join!(stdout, stderr);
        for (stream, joined) in [(Stream::Stdout, stdout), (Stream::Stderr, stderr)] {
            if let Err(e) = joined {
                warn!(%stream, error = %e, "drain task did not finish cleanly");
            }
        }

        let Some(terminal) = stages.pop() else {
            return Err(ParseError::NoStages.into());
        };
        let program = terminal.program.clone();
        let status = terminal
            .wait()
            .await
            .map_err(|source| PipeError::Wait { program, source });

        for stage in stages {
            let _ = stage.wait().await;
        }
        for collector in collectors {
            let _ = collector.await;
        }

        status
    }
}

fn command_for(spec: &StageSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);

    if let Some(ref dir) = spec.dir {
        cmd.current_dir(dir);
    }

    if let Some(ref env) = spec.env {
        cmd.env_clear();
        cmd.envs(env.iter().map(|(k, v)| (k, v)));
    }

    cmd
}

async fn launch_failed(
    started: StartedStages,
    index: usize,
    spec: &StageSpec,
    source: io::Error,
    errors: &OutputBuffer,
) -> PipeError {
    let reaped = started.reap().await;
    let stderr = errors.contents();

    warn!(
        stage = index,
        program = %spec.program,
        error = %source,
        reaped,
        stderr = %stderr,
        "stage failed to start"
    );

    PipeError::launch(index, &spec.program, source, stderr, reaped)
}

/// Start every stage of `stages`, wired into a chain.
///
/// Lines from the terminal stage go to `output`; stderr from earlier stages
/// goes to `errors`.
pub(crate) async fn launch(
    stages: &[StageSpec],
    handler: Option<LineHandler>,
    inherit_stdin: bool,
    output: &OutputBuffer,
    errors: &OutputBuffer,
) -> PipeResult<Completion> {
    let last = stages.len().saturating_sub(1);
    let mut started = StartedStages::default();
    let mut next_stdin: Option<Stdio> = None;

    for (index, spec) in stages.iter().enumerate() {
        let stdin = match next_stdin.take() {
            Some(stdin) => stdin,
            None if inherit_stdin => Stdio::inherit(),
            None => Stdio::null(),
        };

        // The command is dropped right after spawning so the parent holds no
        // copy of the pipe end it was given.
        let spawned = command_for(spec)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return Err(launch_failed(started, index, spec, e, errors).await),
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        started.push(index, spec, child);

        if index < last {
            if let Some(stderr) = stderr {
                started.collectors.push(spawn_collect(index, stderr, errors.clone()));
            }

            let wired: io::Result<Stdio> = stdout
                .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdout was not captured"))
                .and_then(|stdout| stdout.try_into());

            match wired {
                Ok(stdio) => next_stdin = Some(stdio),
                Err(e) => {
                    let next = &stages[index + 1];
                    return Err(launch_failed(started, index + 1, next, e, errors).await);
                }
            }
        } else {
            let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
                let e = io::Error::new(io::ErrorKind::BrokenPipe, "output was not captured");
                return Err(launch_failed(started, index, spec, e, errors).await);
            };

            let drains = [
                spawn_drain(Stream::Stdout, stdout, handler.clone(), output.clone()),
                spawn_drain(Stream::Stderr, stderr, handler, output.clone()),
            ];

            debug!(stages = stages.len(), "pipeline launched");
            return Ok(started.into_completion(drains));
        }
    }

    Err(ParseError::NoStages.into())
}
