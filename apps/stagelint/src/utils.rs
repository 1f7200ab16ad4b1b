//! Supporting helpers: color detection and message prefixes.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Decide whether to colorize, given the environment and stream state.
///
/// `NO_COLOR` always wins; `FORCE_COLOR` (any value but `0`/`false`) forces
/// colors on a non-terminal; otherwise colors follow the terminal check.
pub fn color_choice(no_color: bool, force_color: Option<&str>, is_tty: bool) -> bool {
    if no_color {
        return false;
    }
    match force_color {
        Some(v) if v != "0" && !v.eq_ignore_ascii_case("false") => true,
        Some(_) => false,
        None => is_tty,
    }
}

fn env_colors(is_tty: bool) -> bool {
    let force = std::env::var("FORCE_COLOR").ok();
    color_choice(
        std::env::var_os("NO_COLOR").is_some(),
        force.as_deref(),
        is_tty,
    )
}

/// Colors for stdout report lines. JSON output is never colored.
pub fn use_colors(output: &str) -> bool {
    output != "json" && env_colors(std::io::stdout().is_terminal())
}

fn stderr_colors() -> bool {
    env_colors(std::io::stderr().is_terminal())
}

pub fn info_prefix() -> String {
    if stderr_colors() {
        "⟦info⟧".blue().bold().to_string()
    } else {
        "⟦info⟧".to_string()
    }
}

pub fn note_prefix() -> String {
    if stderr_colors() {
        "⟦note⟧".cyan().bold().to_string()
    } else {
        "⟦note⟧".to_string()
    }
}

pub fn warn_prefix() -> String {
    if stderr_colors() {
        "⟦warn⟧".yellow().bold().to_string()
    } else {
        "⟦warn⟧".to_string()
    }
}

pub fn error_prefix() -> String {
    if stderr_colors() {
        "⟦error⟧".red().bold().to_string()
    } else {
        "⟦error⟧".to_string()
    }
}
