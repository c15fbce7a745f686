// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Command string handling
//!
//! Turns `prog arg "quoted arg" | next $VAR` into stage specifications:
//! lexing, then variable expansion, then grouping on pipes.

mod builder;
mod expand;
mod lexer;

pub use builder::{build_stages, split_stages};
pub use expand::expand;
pub use lexer::{tokenize, Token};
