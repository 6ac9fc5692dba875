//! Terminal output helpers
//!
//! Colored one-line status messages. Everything here writes to stdout and
//! carries no state.

use crate::action::ActionKind;

pub const GREEN: &str = "\x1b[92m";
pub const BLUE: &str = "\x1b[94m";
pub const YELLOW: &str = "\x1b[93m";
pub const RED: &str = "\x1b[91m";
pub const CYAN: &str = "\x1b[96m";
pub const MAGENTA: &str = "\x1b[95m";
pub const DIM: &str = "\x1b[2m";
pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

pub fn info(message: impl AsRef<str>) {
    let icon = if supports_unicode() { "ℹ" } else { "i" };
    println!("{}{} {}{}", BLUE, icon, message.as_ref(), RESET);
}

pub fn success(message: impl AsRef<str>) {
    let icon = if supports_unicode() { "✓" } else { "+" };
    println!("{}{} {}{}", GREEN, icon, message.as_ref(), RESET);
}

pub fn warning(message: impl AsRef<str>) {
    let icon = if supports_unicode() { "⚠" } else { "!" };
    println!("{}{} {}{}", YELLOW, icon, message.as_ref(), RESET);
}

pub fn error(message: impl AsRef<str>) {
    let icon = if supports_unicode() { "✗" } else { "x" };
    println!("{}{} {}{}", RED, icon, message.as_ref(), RESET);
}

pub fn processing(message: impl AsRef<str>) {
    let icon = if supports_unicode() { "⚙" } else { "*" };
    println!("{}{} {}{}", CYAN, icon, message.as_ref(), RESET);
}

pub fn dim(message: impl AsRef<str>) {
    println!("{}{}{}", DIM, message.as_ref(), RESET);
}

/// Announce the action the planner chose
pub fn planned(kind: ActionKind, subject: &str, reasoning: Option<&str>) {
    println!(
        "{}{} Planned:{} {}{}{} {}",
        MAGENTA,
        glyph(kind),
        RESET,
        BOLD,
        kind,
        RESET,
        subject
    );
    if let Some(reasoning) = reasoning.filter(|r| !r.is_empty()) {
        println!("   {}{}{}", DIM, reasoning, RESET);
    }
}

/// Boxed title line
pub fn header(title: &str) {
    let width = title.chars().count() + 4;
    if supports_unicode() {
        println!("{}╭{}╮{}", CYAN, "─".repeat(width), RESET);
        println!("{}│  {}{}{}{}  │{}", CYAN, BOLD, title, RESET, CYAN, RESET);
        println!("{}╰{}╯{}", CYAN, "─".repeat(width), RESET);
    } else {
        println!("{}+{}+{}", CYAN, "-".repeat(width), RESET);
        println!("{}|  {}{}{}{}  |{}", CYAN, BOLD, title, RESET, CYAN, RESET);
        println!("{}+{}+{}", CYAN, "-".repeat(width), RESET);
    }
}

pub fn separator() {
    let line = if supports_unicode() { "─" } else { "-" };
    println!("{}{}{}", DIM, line.repeat(50), RESET);
}

/// Icon for an action kind
pub fn glyph(kind: ActionKind) -> &'static str {
    if !supports_unicode() {
        return match kind {
            ActionKind::Read => "[r]",
            ActionKind::Write => "[w]",
            ActionKind::Run => "[$]",
            ActionKind::Rollback => "[u]",
            ActionKind::Chat => "[?]",
        };
    }
    match kind {
        ActionKind::Read => "📖",
        ActionKind::Write => "✏️",
        ActionKind::Run => "⚡",
        ActionKind::Rollback => "↩️",
        ActionKind::Chat => "💬",
    }
}

/// Check if the terminal likely supports Unicode
pub fn supports_unicode() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term.contains("xterm") || term.contains("256color") || term.contains("kitty") {
            return true;
        }
    }

    for var in &["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(val) = std::env::var(var) {
            if val.to_lowercase().contains("utf") {
                return true;
            }
        }
    }

    false
}
