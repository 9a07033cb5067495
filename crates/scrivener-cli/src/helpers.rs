//! Shared CLI helpers: input reading, response printing, key status.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

/// Read a whole file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print a reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "✒️ Scrivener".cyan().bold());
    if response.is_empty() {
        println!("{}", "(empty reply)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Show a waiting marker on stderr while a call is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ waiting for the model...".dimmed());
}

/// Clear the waiting marker.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Mask all but the last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

/// Whether the home directory (used for `~` paths) can be resolved.
pub fn home_available() -> bool {
    dirs_next::home_dir().is_some()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
