// Defines `AlteredGame`: the game as confirmed by the server plus a local move that the server
// has not echoed back yet.
//
// The general philosophy is that server is trusted, but the user is not. Bogus local moves are
// rejected without touching the confirmed position. A server move that the local rules do not
// accept is reported to the caller rather than treated as a fatal error.
//
// Only one unconfirmed local move is allowed: after sending a move it is the opponent's turn
// in the local position, so another local move would be out of order.

use crate::board::{Board, TurnError, TurnMove};
use crate::force::Force;
use crate::oracle::MoveOracle;


#[derive(Clone, PartialEq, Eq, Debug)]
struct LocalMove {
    mv: TurnMove,
    san: String,
}

// What happened to the local move when a server move arrived.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnConfirmation {
    // There was no local move.
    NoLocalMove,
    // Server echoed the local move.
    Confirmed,
    // Server applied a different move; the local one is lost.
    Discarded,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RemoteMoveError {
    // Mover is not the side to move in the confirmed position (e.g. a duplicate message).
    Stale,
    Invalid(TurnError),
}

#[derive(Clone, Debug)]
pub struct AlteredGame<O: MoveOracle = Board> {
    confirmed: O,
    local_move: Option<LocalMove>,
    // `confirmed` with `local_move` applied.
    local: O,
}

impl<O: MoveOracle> AlteredGame<O> {
    pub fn new() -> Self {
        let confirmed = O::starting_position();
        let local = confirmed.clone();
        AlteredGame { confirmed, local_move: None, local }
    }

    pub fn confirmed(&self) -> &O { &self.confirmed }
    pub fn local(&self) -> &O { &self.local }
    pub fn local_move_san(&self) -> Option<&str> { self.local_move.as_ref().map(|m| m.san.as_str()) }

    pub fn try_local_move(&mut self, mv: TurnMove) -> Result<String, TurnError> {
        if self.local_move.is_some() {
            return Err(TurnError::WrongTurnOrder);
        }
        let san = self.local.apply_move(mv)?;
        self.local_move = Some(LocalMove { mv, san: san.clone() });
        Ok(san)
    }

    pub fn apply_remote_move(
        &mut self, mover: Force, san: &str,
    ) -> Result<TurnConfirmation, RemoteMoveError> {
        if self.confirmed.active_force() != mover {
            return Err(RemoteMoveError::Stale);
        }
        let mv = self.confirmed.apply_algebraic(san).map_err(RemoteMoveError::Invalid)?;
        let confirmation = match self.local_move.take() {
            None => TurnConfirmation::NoLocalMove,
            Some(local) if local.mv == mv => TurnConfirmation::Confirmed,
            Some(local) => {
                log::info!("Local move {} replaced by server move {}", local.san, san);
                TurnConfirmation::Discarded
            }
        };
        self.local = self.confirmed.clone();
        Ok(confirmation)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord;
    use crate::fen::board_to_fen;

    fn mv(from: crate::coord::Coord, to: crate::coord::Coord) -> TurnMove {
        TurnMove { from, to, promote_to: None }
    }

    #[test]
    fn local_move_confirmed() {
        let mut game = AlteredGame::<Board>::new();
        assert_eq!(game.try_local_move(mv(coord!(e2), coord!(e4))), Ok("e4".to_owned()));
        assert_eq!(game.local_move_san(), Some("e4"));
        assert_eq!(game.confirmed().active_force(), Force::White);
        assert_eq!(game.local().active_force(), Force::Black);
        assert_eq!(game.apply_remote_move(Force::White, "e4"), Ok(TurnConfirmation::Confirmed));
        assert_eq!(game.local_move_san(), None);
        assert_eq!(board_to_fen(game.local()), board_to_fen(game.confirmed()));
    }

    #[test]
    fn local_move_discarded() {
        let mut game = AlteredGame::<Board>::new();
        game.try_local_move(mv(coord!(e2), coord!(e4))).unwrap();
        assert_eq!(game.apply_remote_move(Force::White, "d4"), Ok(TurnConfirmation::Discarded));
        assert!(game.local().grid()[coord!(d4)].is_some());
        assert!(game.local().grid()[coord!(e4)].is_none());
    }

    #[test]
    fn single_local_move() {
        let mut game = AlteredGame::<Board>::new();
        game.try_local_move(mv(coord!(e2), coord!(e4))).unwrap();
        assert_eq!(
            game.try_local_move(mv(coord!(d2), coord!(d4))),
            Err(TurnError::WrongTurnOrder)
        );
    }

    #[test]
    fn illegal_local_move_leaves_state_intact() {
        let mut game = AlteredGame::<Board>::new();
        assert_eq!(
            game.try_local_move(mv(coord!(e2), coord!(e5))),
            Err(TurnError::ImpossibleTrajectory)
        );
        assert_eq!(game.local_move_san(), None);
        assert_eq!(game.local().active_force(), Force::White);
    }

    #[test]
    fn stale_and_invalid_remote_moves() {
        let mut game = AlteredGame::<Board>::new();
        game.apply_remote_move(Force::White, "e4").unwrap();
        assert_eq!(game.apply_remote_move(Force::White, "e4"), Err(RemoteMoveError::Stale));
        assert_eq!(
            game.apply_remote_move(Force::Black, "e4"),
            Err(RemoteMoveError::Invalid(TurnError::ImpossibleTrajectory))
        );
        assert_eq!(game.confirmed().active_force(), Force::Black);
    }
}
