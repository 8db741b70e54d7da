use std::fmt;


// Transport could not be established or went away. Always terminal for the game in progress:
// there is no automatic reconnection.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConnectionError {
    CannotConnect(String),
    Closed,
    SendFailed(String),
}

// Inbound frame that cannot be understood. Never fatal: the frame is logged and dropped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ProtocolError {
    NotText(String),
    Malformed(String),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::CannotConnect(details) => write!(f, "cannot connect: {details}"),
            ConnectionError::Closed => write!(f, "connection closed"),
            ConnectionError::SendFailed(details) => write!(f, "cannot send: {details}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::NotText(details) => write!(f, "expected a text frame, got {details}"),
            ProtocolError::Malformed(details) => write!(f, "malformed message: {details}"),
        }
    }
}

impl std::error::Error for ConnectionError {}
impl std::error::Error for ProtocolError {}
