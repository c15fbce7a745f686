// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Terminal color utilities
//!
//! Provides consistent color schemes across the CLI.

use colored::Colorize;

use crate::pipeline::StageSpec;

/// Style for dimmed/secondary text
pub fn dimmed(msg: &str) -> colored::ColoredString {
    msg.dimmed()
}

/// Style for code/commands
pub fn code(msg: &str) -> colored::ColoredString {
    msg.cyan()
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.len().max(40)));
}

/// Print a numbered stage with its argument vector
pub fn print_stage(num: usize, stage: &StageSpec) {
    println!("  {}. {}", num, code(&stage.program));
    for arg in &stage.args {
        println!("     {} {:?}", "→".blue(), arg);
    }
    if let Some(ref dir) = stage.dir {
        println!("     {}", dimmed(&format!("in {}", dir.display())));
    }
}

/// Print every stage of a pipeline
pub fn print_stages(stages: &[StageSpec]) {
    print_header(&format!(
        "Pipeline ({} stage{})",
        stages.len(),
        if stages.len() == 1 { "" } else { "s" }
    ));
    for (i, stage) in stages.iter().enumerate() {
        print_stage(i + 1, stage);
    }
}
