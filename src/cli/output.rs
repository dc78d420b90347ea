//! Terminal output formatting with colors
//!
//! `colored` respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE.
//! Diagnostics go to stderr; results and generated content go to stdout.

use std::fmt::Display;

use colored::Colorize;

/// `error: <msg>` in red on stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// `Warning: <msg>` in yellow on stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Scan progress line (cyan bold) on stderr, keeps stdout clean for --dry-run
pub fn progress(msg: &(impl Display + ?Sized)) {
    eprintln!("{}", msg.to_string().cyan().bold());
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Indented green checkmark, one per included service
pub fn included(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Indented red cross, one per unusable service
pub fn excluded(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Section header for --dry-run and path listings
pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", format!("==> {msg}").cyan().bold());
}

pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// Uncolored line, used for generated file content
pub fn plain(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
