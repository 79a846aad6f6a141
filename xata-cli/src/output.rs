//! Terminal output for the `xata` commands.
//!
//! Progress and results go to stdout, errors and hints to stderr. Schema JSON
//! is printed without styling so it can be piped.

use std::fmt::Display;

use owo_colors::OwoColorize;

/// Command title followed by an underline of the same width
pub fn header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "─".repeat(title.chars().count()).dimmed());
}

/// Indented `key: value` line, used for the resolved target and versions
pub fn kv(key: &str, value: impl Display) {
    println!("  {}: {}", key.dimmed(), value);
}

/// `[n/total]` progress line
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Migration identifier in a listing
pub fn list_item(id: &str) {
    println!("  {} {}", "•".dimmed(), id);
}

pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Failure line on stderr
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Remediation shown under an error
pub fn hint(text: &str) {
    eprintln!("  {} {}", "help:".cyan(), text);
}

pub fn newline() {
    println!();
}

/// Pretty JSON on stdout
pub fn json(value: &serde_json::Value) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
