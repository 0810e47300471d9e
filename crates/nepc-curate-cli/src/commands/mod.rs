//! CLI command implementations.

pub mod curate;
pub mod ids;
pub mod lumped;
pub mod show;

use std::io::{self, BufRead, Write};

use colored::Colorize;

/// Ask a yes/no question on the terminal; anything but `y`/`yes` is no.
pub fn confirm(prompt: &str) -> bool {
    eprint!("{} {} ", prompt.yellow().bold(), "[y/N]".dimmed());
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
