// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.
//
// Improvement potential. Combine integration tests together:
//   https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

use duel_chess::board::{Board, TurnError};
use duel_chess::event::{ClientMessage, ServerMessage};
use duel_chess::force::Force;
use duel_chess::piece::{PieceKind, PieceOnBoard};
use duel_chess::rules::TimeControl;
use duel_chess::session::{MoveAttempt, NotableEvent, PhaseKind, Session};
use duel_chess::test_util::{TestServer, replay_chess_log, test_time};
use duel_chess::transport::TransportEvent;
use duel_chess::utc_time::UtcDateTime;


#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub struct PieceMatcher {
    pub kind: PieceKind,
    pub force: Force,
}

#[allow(dead_code)]
pub trait PieceIs {
    fn is(self, matcher: PieceMatcher) -> bool;
}

impl PieceIs for Option<PieceOnBoard> {
    fn is(self, matcher: PieceMatcher) -> bool {
        if let Some(piece) = self {
            piece.kind == matcher.kind && piece.force == matcher.force
        } else {
            false
        }
    }
}

#[macro_export]
macro_rules! piece {
    ($force:ident $kind:ident) => {
        common::PieceMatcher {
            force: duel_chess::force::Force::$force,
            kind: duel_chess::piece::PieceKind::$kind,
        }
    };
}


#[allow(dead_code)]
pub fn replay_log_from_start(log: &str) -> Result<Board, TurnError> {
    let mut board = Board::starting_position();
    replay_chess_log(&mut board, log)?;
    Ok(board)
}

#[allow(dead_code)]
pub fn t(secs: u64) -> UtcDateTime { test_time(secs) }

#[allow(dead_code)]
pub fn mv(from: &str, to: &str) -> MoveAttempt {
    MoveAttempt::new(
        duel_chess::coord::Coord::from_algebraic(from).unwrap(),
        duel_chess::coord::Coord::from_algebraic(to).unwrap(),
    )
}

#[allow(dead_code)]
pub fn start_msg(colour: Force, client: &str, opponent: &str) -> ServerMessage {
    ServerMessage::Start {
        colour,
        client: client.to_owned(),
        opponent: opponent.to_owned(),
        white_deadline: None,
        black_deadline: None,
    }
}

#[allow(dead_code)]
pub fn moved_msg(san: &str, colour: Force, deadline: Option<UtcDateTime>) -> ServerMessage {
    ServerMessage::Moved { san: san.to_owned(), colour, deadline }
}

#[allow(dead_code)]
pub fn move_sent(san: &str) -> ClientMessage { ClientMessage::Move { san: san.to_owned() } }


// A session wired to an in-memory server. Server messages go through the same JSON framing
// that a real connection would use.
#[allow(dead_code)]
pub struct TestClient {
    pub session: Session<Board>,
    pub server: TestServer,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new() -> Self {
        let server = TestServer::new();
        let session = Session::new(server.connector(), TimeControl::default());
        TestClient { session, server }
    }

    // Delivers a message over the most recent connection.
    pub fn receive(&mut self, message: ServerMessage, now: UtcDateTime) {
        let connection_id = self.server.last_connection_id().unwrap();
        let event = TransportEvent::server_message(connection_id, &message);
        self.session.process_transport_event(event, now);
    }

    pub fn receive_frame(&mut self, frame: &str, now: UtcDateTime) {
        let connection_id = self.server.last_connection_id().unwrap();
        let event = TransportEvent::Text { connection_id, frame: frame.to_owned() };
        self.session.process_transport_event(event, now);
    }

    pub fn events(&mut self) -> Vec<NotableEvent> {
        std::iter::from_fn(|| self.session.next_notable_event()).collect()
    }

    pub fn sent(&self) -> Vec<ClientMessage> { self.server.take_sent() }

    pub fn phase(&self) -> PhaseKind { self.session.phase_kind() }

    pub fn running_force(&self) -> Option<Force> {
        self.session.game().and_then(|game| game.clocks().running_force())
    }

    // Pairs and starts a game at `t(0)`, clearing sent messages and events.
    pub fn start_game(&mut self, colour: Force) {
        self.session.request_pairing(t(0)).unwrap();
        self.receive(start_msg(colour, "Alice", "Bob"), t(0));
        self.sent();
        self.events();
    }
}
