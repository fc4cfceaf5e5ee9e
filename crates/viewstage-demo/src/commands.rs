//! Command parsing for the line-driven demo.
//!
//! This module parses command strings into structured [`Command`] values.

use std::time::Duration;

use crate::views::Button;

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press a button on the topmost view.
    Press {
        /// Button pressed.
        button: Button,
    },

    /// Advance time.
    Tick {
        /// Time to advance.
        elapsed: Duration,
    },

    /// Print the current location and overlays.
    Status,

    /// Stop reading commands.
    Exit,

    /// Blank line or comment.
    Empty,

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a user input string into a command.
///
/// Commands start with `/`. Lines starting with `#` are comments.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() || input.starts_with('#') {
        return Command::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Unknown { input: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "press" | "p" => match parts.get(1).copied() {
            Some("start") => Command::Press { button: Button::Start },
            Some("quit") => Command::Press { button: Button::Quit },
            Some("back") => Command::Press { button: Button::Back },
            Some("confirm") => Command::Press { button: Button::Confirm },
            Some("cancel") => Command::Press { button: Button::Cancel },
            Some("level") => match parts.get(2) {
                Some(number) => match number.parse::<usize>() {
                    Ok(number) => Command::Press { button: Button::Level(number) },
                    Err(_) => Command::InvalidArgs {
                        command: "press".into(),
                        error: "Invalid level number".into(),
                    },
                },
                None => Command::InvalidArgs {
                    command: "press".into(),
                    error: "Usage: /press level <number>".into(),
                },
            },
            Some(other) => Command::InvalidArgs {
                command: "press".into(),
                error: format!("Unknown button: {other}"),
            },
            None => Command::InvalidArgs {
                command: "press".into(),
                error: "Usage: /press <start|quit|back|confirm|cancel|level N>".into(),
            },
        },

        "tick" | "t" => match parts.get(1) {
            Some(ms) => match ms.parse::<u64>() {
                Ok(ms) => Command::Tick { elapsed: Duration::from_millis(ms) },
                Err(_) => Command::InvalidArgs {
                    command: "tick".into(),
                    error: "Invalid milliseconds".into(),
                },
            },
            None => Command::InvalidArgs {
                command: "tick".into(),
                error: "Usage: /tick <ms>".into(),
            },
        },

        "status" | "s" => Command::Status,

        "exit" | "q" => Command::Exit,

        _ => Command::Unknown { input: input.to_string() },
    }
}
