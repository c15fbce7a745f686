// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Command builder
//!
//! Groups expanded words between pipe separators into one [`StageSpec`] each.

use std::path::Path;

use tracing::debug;

use super::expand::expand;
use super::lexer::{tokenize, Token};
use crate::env::EnvPolicy;
use crate::errors::ParseError;
use crate::pipeline::StageSpec;

/// Split `tokens` on pipes into word groups.
///
/// Every group must be non-empty; a leading, trailing or doubled pipe is
/// reported with the index of the empty group.
pub fn split_stages(tokens: Vec<Token>) -> Result<Vec<Vec<String>>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let mut groups = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => current.push(word),
            Token::Pipe => {
                if current.is_empty() {
                    return Err(ParseError::EmptyStage {
                        index: groups.len(),
                    });
                }
                groups.push(std::mem::take(&mut current));
            }
        }
    }

    if current.is_empty() {
        return Err(ParseError::EmptyStage {
            index: groups.len(),
        });
    }
    groups.push(current);

    Ok(groups)
}

/// Parse a command string into resolved stage specifications.
pub fn build_stages(
    command: &str,
    env: &EnvPolicy,
    dir: &Path,
) -> Result<Vec<StageSpec>, ParseError> {
    let tokens = tokenize(command)?
        .into_iter()
        .map(|token| match token {
            Token::Word(word) => Token::Word(expand(&word, env)),
            Token::Pipe => Token::Pipe,
        })
        .collect();

    let stage_env = env.materialize();

    let stages: Vec<StageSpec> = split_stages(tokens)?
        .into_iter()
        .map(|mut words| {
            let program = words.remove(0);
            StageSpec {
                program,
                args: words,
                dir: Some(dir.to_path_buf()),
                env: stage_env.clone(),
            }
        })
        .collect();

    debug!(
        stages = stages.len(),
        dir = %dir.display(),
        override_env = env.is_override(),
        "built pipeline stages"
    );

    Ok(stages)
}
