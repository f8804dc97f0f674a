use serde::{Deserialize, Serialize};

/// Commands understood on the inbound remote string channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    Start,
    Stop,
}

impl RemoteCommand {
    /// Exact, case-sensitive match after trimming surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// The two long-lived loops of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactorKind {
    Motion,
    Vision,
}

/// What the host process should do after a lifecycle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    /// Remote went away; the process is expected to exit.
    Exit,
}
