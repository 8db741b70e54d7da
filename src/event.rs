// Wire schema. Every frame is a flat JSON object with a `command` discriminator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::force::Force;
use crate::utc_time::UtcDateTime;


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientMessage {
    FindOpponent,
    Move { san: String },
    // Asks the server to check whether the player to move has run out of time. The server
    // decides; the client never declares a loss on time by itself.
    EndIfTimeout,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ServerMessage {
    Start {
        colour: Force,
        client: String,   // our display name
        opponent: String, // opponent display name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        white_deadline: Option<UtcDateTime>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        black_deadline: Option<UtcDateTime>,
    },
    Moved {
        san: String,
        colour: Force, // side that made the move
        // Deadline for the side to move next.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deadline: Option<UtcDateTime>,
    },
    Win {
        winner_colour: Force,
        by: String,
    },
    Draw,
    Abandoned,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum VictoryReason {
    Abandonment, // includes resignation
    Timeout,
    Checkmate,
    Other(String),
}

impl VictoryReason {
    pub fn from_protocol(by: &str) -> Self {
        match by {
            "abandonment" | "resignation" => VictoryReason::Abandonment,
            "timeout" => VictoryReason::Timeout,
            "checkmate" => VictoryReason::Checkmate,
            _ => VictoryReason::Other(by.to_owned()),
        }
    }
}

impl fmt::Display for VictoryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VictoryReason::Abandonment => f.write_str("abandonment"),
            VictoryReason::Timeout => f.write_str("timeout"),
            VictoryReason::Checkmate => f.write_str("checkmate"),
            VictoryReason::Other(by) => f.write_str(by),
        }
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|err| ProtocolError::Malformed(err.to_string()))
    }
}

impl ServerMessage {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|err| ProtocolError::Malformed(format!("{err}: {frame}")))
    }
}
