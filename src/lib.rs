#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod algebraic;
pub mod altered_game;
pub mod board;
pub mod clock;
pub mod coord;
pub mod dual_clock;
pub mod error;
pub mod event;
pub mod fen;
pub mod force;
pub mod grid;
pub mod oracle;
pub mod piece;
pub mod presentation;
pub mod rules;
pub mod session;
pub mod test_util;
pub mod ticker;
pub mod transport;
pub mod utc_time;
pub mod util;

pub use board::{Board, ChessGameStatus, DrawReason, TurnError, TurnMove};
pub use clock::{Clock, ClockShowing, LowTimeLevel, TimeBreakdown};
pub use coord::{Col, Coord, Row};
pub use event::{ClientMessage, ServerMessage, VictoryReason};
pub use force::Force;
pub use oracle::MoveOracle;
pub use piece::{PieceKind, PieceOnBoard};
pub use rules::TimeControl;
pub use session::{
    GameOutcome, MoveAttempt, MoveAttemptOutcome, NotableEvent, PhaseKind, Session,
    TurnCommandError,
};
pub use utc_time::UtcDateTime;
