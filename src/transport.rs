use std::sync::mpsc;

use crate::error::ConnectionError;
use crate::event::{ClientMessage, ServerMessage};


// Identifies one physical connection. Events from a connection that has since been replaced
// are ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConnectionId(pub u64);

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TransportEvent {
    Text { connection_id: ConnectionId, frame: String },
    // Binary, ping, etc. Carries a short description for logging.
    NonText { connection_id: ConnectionId, description: String },
    // Delivered at most once per connection.
    Closed { connection_id: ConnectionId },
}

impl TransportEvent {
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::Text { connection_id, .. }
            | TransportEvent::NonText { connection_id, .. }
            | TransportEvent::Closed { connection_id } => *connection_id,
        }
    }

    pub fn server_message(connection_id: ConnectionId, message: &ServerMessage) -> Self {
        // `ServerMessage` consists of strings and plain enums: serialization cannot fail.
        let frame = serde_json::to_string(message).unwrap_or_default();
        TransportEvent::Text { connection_id, frame }
    }
}

// Outbound half of a connection. Inbound frames are delivered separately as `TransportEvent`s
// through whatever event loop the application runs.
pub trait Transport: Send {
    fn connection_id(&self) -> ConnectionId;
    fn send(&mut self, message: &ClientMessage) -> Result<(), ConnectionError>;
    fn close(&mut self);
}

pub trait Connector {
    fn connect(&mut self, connection_id: ConnectionId) -> Result<Box<dyn Transport>, ConnectionError>;
}

// Transport that hands messages to another thread (network writer or test server). Sending
// fails once the receiving end is gone.
pub struct ChannelTransport {
    connection_id: ConnectionId,
    outgoing: Option<mpsc::Sender<ClientMessage>>,
}

impl ChannelTransport {
    pub fn new(connection_id: ConnectionId, outgoing: mpsc::Sender<ClientMessage>) -> Self {
        ChannelTransport { connection_id, outgoing: Some(outgoing) }
    }
}

impl Transport for ChannelTransport {
    fn connection_id(&self) -> ConnectionId { self.connection_id }

    fn send(&mut self, message: &ClientMessage) -> Result<(), ConnectionError> {
        let outgoing = self.outgoing.as_ref().ok_or(ConnectionError::Closed)?;
        outgoing.send(message.clone()).map_err(|_| ConnectionError::Closed)
    }

    fn close(&mut self) { self.outgoing = None; }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_transport() {
        let (tx, rx) = mpsc::channel();
        let mut transport = ChannelTransport::new(ConnectionId(7), tx);
        assert_eq!(transport.connection_id(), ConnectionId(7));
        transport.send(&ClientMessage::FindOpponent).unwrap();
        assert_eq!(rx.try_recv(), Ok(ClientMessage::FindOpponent));
        drop(rx);
        assert_eq!(transport.send(&ClientMessage::EndIfTimeout), Err(ConnectionError::Closed));
    }

    #[test]
    fn closed_transport_rejects_sends() {
        let (tx, _rx) = mpsc::channel();
        let mut transport = ChannelTransport::new(ConnectionId(1), tx);
        transport.close();
        assert_eq!(transport.send(&ClientMessage::FindOpponent), Err(ConnectionError::Closed));
    }
}
