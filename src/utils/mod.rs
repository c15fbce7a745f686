// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Utility modules
//!
//! Common utilities for the procpipe CLI.

pub mod colors;

pub use colors::*;
