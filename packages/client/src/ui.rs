//! Terminal input parsing and prompt handling.

use std::io::Write;

use crate::session::UserCommand;

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat(String),
    User(UserCommand),
    /// End the live screen share from outside the session
    EndScreenShare,
    Status,
    Help,
    Unknown(String),
}

/// Parse a line of input. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Chat(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let command = match (parts.next(), parts.next()) {
        (Some("camera"), name) => Command::User(UserCommand::SwitchCamera(name.map(str::to_string))),
        (Some("screen"), None) => Command::User(UserCommand::ShareScreen),
        (Some("stop-share"), None) => Command::EndScreenShare,
        (Some("status"), None) => Command::Status,
        (Some("help"), None) => Command::Help,
        (Some("quit" | "exit"), None) => Command::User(UserCommand::Exit),
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

/// Redisplay the prompt after printing something
pub fn redisplay_prompt(prompt: &str) {
    print!("{}> ", prompt);
    std::io::stdout().flush().ok();
}
