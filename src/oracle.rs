use crate::board::{Board, ChessGameStatus, TurnError, TurnMove};
use crate::coord::Coord;
use crate::fen;
use crate::force::Force;


// Everything the session needs to know about the rules of the game. The session never looks
// at pieces directly.
pub trait MoveOracle: Clone {
    fn starting_position() -> Self;
    // Position encoding for board widgets (FEN for chess).
    fn encoding(&self) -> String;
    fn active_force(&self) -> Force;
    fn status(&self) -> ChessGameStatus;
    fn legal_destinations(&self, from: Coord) -> Vec<Coord>;
    fn is_promotion(&self, from: Coord, to: Coord) -> bool;
    // Returns the move in short algebraic notation.
    fn apply_move(&mut self, mv: TurnMove) -> Result<String, TurnError>;
    fn apply_algebraic(&mut self, notation: &str) -> Result<TurnMove, TurnError>;
}

impl MoveOracle for Board {
    fn starting_position() -> Self { Board::starting_position() }
    fn encoding(&self) -> String { fen::board_to_fen(self) }
    fn active_force(&self) -> Force { self.active_force() }
    fn status(&self) -> ChessGameStatus { self.status() }
    fn legal_destinations(&self, from: Coord) -> Vec<Coord> { self.legal_destinations(from) }
    fn is_promotion(&self, from: Coord, to: Coord) -> bool { self.is_promotion(from, to) }
    fn apply_move(&mut self, mv: TurnMove) -> Result<String, TurnError> { self.try_turn(mv) }
    fn apply_algebraic(&mut self, notation: &str) -> Result<TurnMove, TurnError> {
        self.try_turn_algebraic(notation)
    }
}
