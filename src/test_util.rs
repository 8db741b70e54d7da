// Test utilities shared by unit tests and the integration tests in the "tests" folder.

use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::board::{Board, TurnError};
use crate::error::ConnectionError;
use crate::event::ClientMessage;
use crate::transport::{ChannelTransport, ConnectionId, Connector, Transport};
use crate::utc_time::UtcDateTime;


lazy_static! {
    static ref TURN_NUMBER_RE: Regex = Regex::new(r"^(?:[0-9]+\.+)?(.*)$").unwrap();
}

pub fn replay_chess_log(board: &mut Board, log: &str) -> Result<(), TurnError> {
    for turn_notation in log.split_whitespace() {
        let turn_notation = TURN_NUMBER_RE.captures(turn_notation).unwrap().get(1).unwrap().as_str();
        if turn_notation.is_empty() {
            // Whitespace after turn number.
            continue;
        }
        board.try_turn_algebraic(turn_notation)?;
    }
    Ok(())
}

// Fixed point in time for tests, plus an offset in seconds.
pub fn test_time(secs: u64) -> UtcDateTime {
    UtcDateTime::parse("2024-01-01T12:00:00Z").unwrap() + Duration::from_secs(secs)
}


#[derive(Default)]
struct TestServerState {
    connections: Vec<(ConnectionId, mpsc::Receiver<ClientMessage>)>,
    refuse_connections: bool,
}

// Collects what clients send. Server messages are fed to the session directly by the test.
#[derive(Clone, Default)]
pub struct TestServer {
    state: Arc<Mutex<TestServerState>>,
}

pub struct TestConnector {
    state: Arc<Mutex<TestServerState>>,
}

impl TestServer {
    pub fn new() -> Self { Self::default() }

    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(TestConnector { state: Arc::clone(&self.state) })
    }

    pub fn connection_count(&self) -> usize { self.state.lock().unwrap().connections.len() }

    pub fn last_connection_id(&self) -> Option<ConnectionId> {
        self.state.lock().unwrap().connections.last().map(|(id, _)| *id)
    }

    // Drains messages sent over all connections so far.
    pub fn take_sent(&self) -> Vec<ClientMessage> {
        let state = self.state.lock().unwrap();
        state.connections.iter().flat_map(|(_, rx)| rx.try_iter()).collect()
    }

    // Breaks all existing connections: further sends fail.
    pub fn drop_connections(&self) { self.state.lock().unwrap().connections.clear(); }

    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_connections = refuse;
    }
}

impl Connector for TestConnector {
    fn connect(&mut self, connection_id: ConnectionId) -> Result<Box<dyn Transport>, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connections {
            return Err(ConnectionError::CannotConnect("connection refused".to_owned()));
        }
        let (tx, rx) = mpsc::channel();
        state.connections.push((connection_id, rx));
        Ok(Box::new(ChannelTransport::new(connection_id, tx)))
    }
}
