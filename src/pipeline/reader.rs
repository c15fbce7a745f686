// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Concurrent line reader
//!
//! The terminal stage's stdout and stderr are each drained by their own task.
//! Bytes are reassembled into `\n`-terminated lines, passed through the line
//! handler and appended to a shared [`OutputBuffer`] without a separator.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::definition::LineHandler;

const CHUNK_SIZE: usize = 1024;

/// Append-only text buffer shared between drain tasks and the pipeline
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        // A panicking line handler never holds the lock, so the text is intact
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append text
    pub fn append(&self, text: &str) {
        self.lock().push_str(text);
    }

    /// Copy of the current contents
    pub fn contents(&self) -> String {
        self.lock().clone()
    }
}

/// Which stream of the terminal stage a drain task reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Read `reader` to the end, appending each complete line to `buffer`.
///
/// Trailing bytes without a final newline are discarded. A read error ends
/// the drain the same way end-of-stream does.
pub async fn drain_lines<R>(
    stream: Stream,
    mut reader: R,
    handler: Option<LineHandler>,
    buffer: OutputBuffer,
) where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();
    let mut lines = 0usize;

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(%stream, error = %e, "drain stopped on read error");
                break;
            }
        };
        // Bytes already in `pending` hold no newline
        let mut scanned = pending.len();
        pending.extend_from_slice(&chunk[..n]);

        let mut start = 0;
        while let Some(pos) = pending[scanned..].iter().position(|&b| b == b'\n') {
            let end = scanned + pos;
            let line = String::from_utf8_lossy(&pending[start..end]);
            let line = match &handler {
                Some(handler) => handler(&line),
                None => line.into_owned(),
            };
            trace!(%stream, line = %line, "line");
            buffer.append(&line);
            lines += 1;
            start = end + 1;
            scanned = start;
        }
        pending.drain(..start);
    }

    debug!(%stream, lines, discarded = pending.len(), "drain finished");
}

/// Spawn a drain task for one stream of the terminal stage
pub fn spawn_drain<R>(
    stream: Stream,
    reader: R,
    handler: Option<LineHandler>,
    buffer: OutputBuffer,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(drain_lines(stream, reader, handler, buffer))
}

/// Spawn a task copying a non-terminal stage's stderr verbatim into `buffer`
pub fn spawn_collect<R>(index: usize, mut reader: R, buffer: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut raw = Vec::new();
        if let Err(e) = reader.read_to_end(&mut raw).await {
            debug!(stage = index, error = %e, "stderr collection stopped on read error");
        }
        if !raw.is_empty() {
            buffer.append(&String::from_utf8_lossy(&raw));
        }
    })
}
