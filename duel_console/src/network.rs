// Websocket transport. One reader thread turns incoming frames into `TransportEvent`s for the
// main event loop; one writer thread serializes outgoing messages.

use std::fmt;
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;

use duel_chess::error::ConnectionError;
use duel_chess::event::ClientMessage;
use duel_chess::transport::{ChannelTransport, ConnectionId, Connector, Transport, TransportEvent};
use tungstenite::protocol::Role;
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::client_main::IncomingEvent;


pub const GAME_ENDPOINT: &str = "/ws/game/";


pub struct WebSocketConnector {
    server_address: String,
    events: mpsc::Sender<IncomingEvent>,
}

impl WebSocketConnector {
    pub fn new(server_address: String, events: mpsc::Sender<IncomingEvent>) -> Self {
        WebSocketConnector { server_address, events }
    }
}

impl Connector for WebSocketConnector {
    fn connect(&mut self, connection_id: ConnectionId) -> Result<Box<dyn Transport>, ConnectionError> {
        let url = Url::parse(&format!("ws://{}{}", self.server_address, GAME_ENDPOINT))
            .map_err(cannot_connect)?;
        let server_addr = url.socket_addrs(|| Some(80)).map_err(cannot_connect)?;
        log::info!("Connecting to {url} ({server_addr:?})");
        let stream = TcpStream::connect(&server_addr[..]).map_err(cannot_connect)?;
        // Improvement potential: Test if nodelay helps.
        let (socket_in, _) = tungstenite::client(url, stream).map_err(cannot_connect)?;
        let socket_out = clone_websocket(&socket_in, Role::Client).map_err(cannot_connect)?;

        let read_events = self.events.clone();
        thread::spawn(move || read_loop(connection_id, socket_in, read_events));
        let write_events = self.events.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || write_loop(connection_id, socket_out, rx, write_events));
        Ok(Box::new(ChannelTransport::new(connection_id, tx)))
    }
}

fn cannot_connect(err: impl fmt::Display) -> ConnectionError {
    ConnectionError::CannotConnect(err.to_string())
}

fn read_loop(
    connection_id: ConnectionId, mut socket: WebSocket<TcpStream>,
    events: mpsc::Sender<IncomingEvent>,
) {
    loop {
        let event = match socket.read() {
            Ok(Message::Text(frame)) => TransportEvent::Text {
                connection_id,
                frame: frame.as_str().to_owned(),
            },
            Ok(Message::Close(_)) => TransportEvent::Closed { connection_id },
            Ok(message) => TransportEvent::NonText {
                connection_id,
                description: format!("{message:?}"),
            },
            Err(err) => {
                log::info!("Connection {connection_id:?} read failed: {err}");
                TransportEvent::Closed { connection_id }
            }
        };
        let closed = matches!(event, TransportEvent::Closed { .. });
        if events.send(IncomingEvent::Network(event)).is_err() || closed {
            return;
        }
    }
}

// Runs until the transport is closed (the sender is dropped) or the socket fails. On failure
// the session gets `Closed` right away and further sends on the transport fail.
fn write_loop(
    connection_id: ConnectionId, mut socket: WebSocket<TcpStream>,
    messages: mpsc::Receiver<ClientMessage>, events: mpsc::Sender<IncomingEvent>,
) {
    for message in messages {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Cannot encode {message:?}: {err}");
                continue;
            }
        };
        if let Err(err) = socket.send(Message::Text(frame.into())) {
            log::warn!("{}", ConnectionError::SendFailed(err.to_string()));
            let _ = events.send(IncomingEvent::Network(TransportEvent::Closed { connection_id }));
            return;
        }
    }
    if let Err(err) = socket.close(None).and_then(|()| socket.flush()) {
        log::debug!("Error while closing websocket: {err}");
    }
}

// TODO: Instead of cloning the socket, consider calling TcpStream.set_nonblocking on the
//   underlying stream and doing read/writes in the same thread.
pub fn clone_websocket(
    socket: &WebSocket<TcpStream>, role: Role,
) -> std::io::Result<WebSocket<TcpStream>> {
    let stream = socket.get_ref().try_clone()?;
    let config = socket.get_config().clone();
    Ok(WebSocket::from_raw_socket(stream, role, Some(config)))
}
