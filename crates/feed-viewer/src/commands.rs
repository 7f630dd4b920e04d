//! Viewer commands read from stdin, one per line

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// A user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Uncheck a guild's toggle
    Hide(String),
    /// Check a guild's toggle
    Show(String),
    /// Flip a guild's toggle
    Toggle(String),
    /// Log the current state
    Status,
}

/// Command parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("`{0}` needs a guild name")]
    MissingGuild(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let guild = rest.trim();

        let with_guild = |name: &'static str, build: fn(String) -> Command| {
            if guild.is_empty() {
                Err(CommandError::MissingGuild(name))
            } else {
                Ok(build(guild.to_string()))
            }
        };

        match verb.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "hide" => with_guild("hide", Command::Hide),
            "show" => with_guild("show", Command::Show),
            "toggle" => with_guild("toggle", Command::Toggle),
            "status" => Ok(Command::Status),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}

/// Forward stdin lines to `tx` until EOF or the receiver is dropped
pub fn spawn_stdin_reader(tx: mpsc::Sender<String>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    })
}
