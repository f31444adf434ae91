//! Colored console status lines.

use std::io::{IsTerminal, Write};

const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

/// Status line category, each with its own color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

impl Tone {
    fn color(&self) -> &'static str {
        match self {
            Tone::Info => YELLOW,
            Tone::Success => GREEN,
            Tone::Error => RED,
        }
    }
}

/// Wrap `message` in the tone's color when `colored` is set.
pub fn paint(message: &str, tone: Tone, colored: bool) -> String {
    if colored {
        format!("{}{}{}", tone.color(), message, RESET)
    } else {
        message.to_string()
    }
}

/// Print a status line to stdout, colored when stdout is a terminal.
pub fn status(message: &str, tone: Tone) {
    let stdout = std::io::stdout();
    let colored = stdout.is_terminal();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", paint(message, tone, colored));
}

/// Print an error line to stderr, colored when stderr is a terminal.
pub fn error(message: &str) {
    let stderr = std::io::stderr();
    let colored = stderr.is_terminal();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "{}", paint(message, Tone::Error, colored));
}
