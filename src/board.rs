// Standard chess rules. The client uses `Board` to pre-validate local moves and to replay
// moves confirmed by the server. The server is the authority: `Board` never decides who
// wins on time or by abandonment.

use std::collections::HashMap;

use enum_map::{EnumMap, enum_map};
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::algebraic::{AlgebraicMove, AlgebraicTurn};
use crate::coord::{Col, Coord, SubjectiveRow};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{CastleDirection, PieceKind, PieceOnBoard};
use crate::util::sort_two;


fn direction_forward(force: Force) -> i8 {
    match force {
        Force::White => 1,
        Force::Black => -1,
    }
}

fn home_row_coord(force: Force, col: Col) -> Coord {
    Coord::new(SubjectiveRow::from_one_based(1).to_row(force), col)
}

fn castling_rook_col(dir: CastleDirection) -> Col {
    match dir {
        CastleDirection::ASide => Col::A,
        CastleDirection::HSide => Col::H,
    }
}

fn find_king(grid: &Grid, force: Force) -> Option<Coord> {
    grid.pieces()
        .find(|(_, piece)| piece.kind == PieceKind::King && piece.force == force)
        .map(|(pos, _)| pos)
}

fn should_promote(force: Force, piece_kind: PieceKind, to: Coord) -> bool {
    let last_row = SubjectiveRow::from_one_based(8).to_row(force);
    piece_kind == PieceKind::Pawn && to.row == last_row
}

fn get_capture(
    grid: &Grid, from: Coord, to: Coord, en_passant_target: Option<Coord>,
) -> Option<Coord> {
    let piece = grid[from]?;
    if let Some(target_piece) = grid[to] {
        if target_piece.force == piece.force { None } else { Some(to) }
    } else if piece.kind == PieceKind::Pawn && Some(to) == en_passant_target {
        Some(Coord::new(from.row, to.col))
    } else {
        None
    }
}

fn is_attacked_by(grid: &Grid, pos: Coord, attacker: Force) -> bool {
    grid.pieces().any(|(from, piece)| {
        piece.force == attacker && proto_reachability(grid, from, pos).ok_if_capturing()
    })
}

fn is_check_to(grid: &Grid, force: Force) -> bool {
    match find_king(grid, force) {
        Some(king_pos) => is_attacked_by(grid, king_pos, force.opponent()),
        None => false,
    }
}

fn reachability(grid: &Grid, from: Coord, to: Coord, capturing: bool) -> Reachability {
    use ProtoReachability::*;
    match proto_reachability(grid, from, to) {
        Ok => Reachability::Ok,
        OkIfCapturing => if capturing { Reachability::Ok } else { Reachability::Blocked },
        OkIfNonCapturing => if !capturing { Reachability::Ok } else { Reachability::Blocked },
        Blocked => Reachability::Blocked,
        Impossible => Reachability::Impossible,
    }
}

// Tests that the piece can move in such a way and that the path is free.
// Does not support castling.
fn proto_reachability(grid: &Grid, from: Coord, to: Coord) -> ProtoReachability {
    use ProtoReachability::*;
    let proto = proto_reachability_modulo_destination_square(grid, from, to);
    match proto {
        Blocked | Impossible => proto,
        Ok | OkIfCapturing | OkIfNonCapturing => {
            if let (Some(piece), Some(mover)) = (grid[to], grid[from]) {
                if piece.force == mover.force {
                    return Blocked;
                }
            }
            proto
        }
    }
}

fn proto_reachability_modulo_destination_square(
    grid: &Grid, from: Coord, to: Coord,
) -> ProtoReachability {
    use ProtoReachability::*;
    if to == from {
        return Impossible;
    }
    let Some(piece) = grid[from] else {
        return Impossible;
    };

    let (d_row, d_col) = to - from;
    let is_straight_move = d_row == 0 || d_col == 0;
    let is_diagonal_move = d_row.abs() == d_col.abs();
    // Tests that squares between `from` (exclusive) and `to` (exclusive) are free.
    let has_linear_passage = || {
        let direction = (d_row.signum(), d_col.signum());
        let mut pos = from + direction;
        while pos != to {
            if grid[pos].is_some() {
                return false;
            }
            pos = pos + direction;
        }
        true
    };
    let simple_linear_passage = || if has_linear_passage() { Ok } else { Blocked };

    match piece.kind {
        PieceKind::Pawn => {
            let dir_forward = direction_forward(piece.force);
            let second_row = SubjectiveRow::from_one_based(2).to_row(piece.force);
            let valid_capturing_move = d_col.abs() == 1 && d_row == dir_forward;
            let valid_non_capturing_move = d_col == 0
                && (d_row == dir_forward || (from.row == second_row && d_row == dir_forward * 2));
            match (valid_capturing_move, valid_non_capturing_move) {
                (true, true) => unreachable!("A pawn move cannot be both capturing and non-capturing"),
                (true, false) => OkIfCapturing,
                (false, true) => {
                    if has_linear_passage() && grid[to].is_none() {
                        OkIfNonCapturing
                    } else {
                        Blocked
                    }
                }
                (false, false) => Impossible,
            }
        }
        PieceKind::Knight => {
            if sort_two((d_row.abs(), d_col.abs())) == (1, 2) { Ok } else { Impossible }
        }
        PieceKind::Bishop => {
            if is_diagonal_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Rook => {
            if is_straight_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Queen => {
            if is_straight_move || is_diagonal_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::King => {
            if d_row.abs() <= 1 && d_col.abs() <= 1 { Ok } else { Impossible }
        }
    }
}

fn castling_direction(piece: PieceOnBoard, from: Coord, to: Coord) -> Option<CastleDirection> {
    if piece.kind != PieceKind::King || from != home_row_coord(piece.force, Col::E) {
        return None;
    }
    match to - from {
        (0, 2) => Some(CastleDirection::HSide),
        (0, -2) => Some(CastleDirection::ASide),
        _ => None,
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ProtoReachability {
    Ok,
    OkIfCapturing,
    OkIfNonCapturing,
    Blocked,
    Impossible,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Reachability {
    Ok,
    Blocked,
    Impossible,
}

impl ProtoReachability {
    fn ok_if_capturing(self) -> bool {
        matches!(self, ProtoReachability::Ok | ProtoReachability::OkIfCapturing)
    }
    fn possible(self) -> bool { self != ProtoReachability::Impossible }
}

#[derive(Clone, Debug)]
struct TurnOutcome {
    new_grid: Grid,
    piece_kind: PieceKind,
    capture: Option<PieceKind>,
    castle: Option<CastleDirection>,
}

// Castling is represented as a king move by two squares, which is also how it's entered
// by dragging the king.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TurnMove {
    pub from: Coord,
    pub to: Coord,
    pub promote_to: Option<PieceKind>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChessGameStatus {
    Active,
    Checkmate { winner: Force },
    Draw(DrawReason),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnError {
    InvalidNotation,
    AmbiguousNotation,
    CaptureNotationRequiresCapture,
    PieceMissing,
    WrongTurnOrder,
    ImpossibleTrajectory,
    PathBlocked,
    UnprotectedKing,
    CastlingPieceHasMoved,
    BadPromotion,
    GameOver,
}

pub type CastlingRights = EnumMap<Force, EnumMap<CastleDirection, bool>>;

// Two positions are "the same" for the purpose of repetition if the same pieces occupy the
// same squares, the same player has the move, castling rights are the same and en passant
// possibility is the same.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct PositionForRepetitionDraw {
    grid: Grid,
    active_force: Force,
    castling_rights: CastlingRights,
    en_passant_target: Option<Coord>,
}

impl ChessGameStatus {
    pub fn is_active(self) -> bool { self == ChessGameStatus::Active }
}

#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    active_force: Force,
    castling_rights: CastlingRights,
    en_passant_target: Option<Coord>,
    half_move_clock: u32, // half-moves since last capture or pawn move
    full_move_number: u32,
    position_count: HashMap<PositionForRepetitionDraw, u8>,
    status: ChessGameStatus,
}

impl Board {
    pub fn starting_position() -> Board {
        use PieceKind::*;
        let mut grid = Grid::new();
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for force in Force::iter() {
            for (col, kind) in Col::all().zip_eq(back_rank) {
                grid[home_row_coord(force, col)] = Some(PieceOnBoard::new(kind, force));
                let pawn_row = SubjectiveRow::from_one_based(2).to_row(force);
                grid[Coord::new(pawn_row, col)] = Some(PieceOnBoard::new(Pawn, force));
            }
        }
        Board::from_parts(grid, Force::White, enum_map! { _ => enum_map! { _ => true } }, None, 0, 1)
    }

    pub fn from_parts(
        grid: Grid, active_force: Force, castling_rights: CastlingRights,
        en_passant_target: Option<Coord>, half_move_clock: u32, full_move_number: u32,
    ) -> Board {
        let mut board = Board {
            grid,
            active_force,
            castling_rights,
            en_passant_target,
            half_move_clock,
            full_move_number,
            position_count: HashMap::new(),
            status: ChessGameStatus::Active,
        };
        board.record_position();
        board.status = board.compute_status();
        board
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn active_force(&self) -> Force { self.active_force }
    pub fn status(&self) -> ChessGameStatus { self.status }
    pub fn castling_rights(&self) -> &CastlingRights { &self.castling_rights }
    pub fn en_passant_target(&self) -> Option<Coord> { self.en_passant_target }
    pub fn half_move_clock(&self) -> u32 { self.half_move_clock }
    pub fn full_move_number(&self) -> u32 { self.full_move_number }
    pub fn is_check(&self) -> bool { is_check_to(&self.grid, self.active_force) }

    pub fn legal_moves(&self) -> Vec<TurnMove> {
        self.candidate_moves()
            .into_iter()
            .filter(|&mv| self.turn_outcome(mv).is_ok())
            .collect()
    }

    pub fn legal_destinations(&self, from: Coord) -> Vec<Coord> {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .map(|mv| mv.to)
            .unique()
            .collect()
    }

    // Whether there is a legal move from `from` to `to` that requires choosing a promotion.
    pub fn is_promotion(&self, from: Coord, to: Coord) -> bool {
        let Some(piece) = self.grid[from] else {
            return false;
        };
        should_promote(piece.force, piece.kind, to)
            && self
                .turn_outcome(TurnMove { from, to, promote_to: Some(PieceKind::Queen) })
                .is_ok()
    }

    // Applies the turn and returns its notation in short algebraic form, e.g. "Nxf7+".
    pub fn try_turn(&mut self, mv: TurnMove) -> Result<String, TurnError> {
        // Turn application is split into two phases:
        //   - First, check turn validity and determine the outcome (does not change
        //     game state, can fail if the turn is invalid).
        //   - Second, apply the outcome (changes game state, cannot fail).
        let outcome = self.turn_outcome(mv)?;
        let algebraic = self.outcome_to_algebraic(mv, &outcome);
        self.apply_turn(mv, outcome);
        let mark = match self.status {
            ChessGameStatus::Checkmate { .. } => "#",
            _ if self.is_check() => "+",
            _ => "",
        };
        Ok(format!("{}{}", algebraic.format(), mark))
    }

    pub fn try_turn_algebraic(&mut self, notation: &str) -> Result<TurnMove, TurnError> {
        let mv = self.algebraic_to_turn(notation)?;
        self.try_turn(mv)?;
        Ok(mv)
    }

    // Returns the notation `try_turn` would produce without changing the board.
    pub fn turn_to_algebraic(&self, mv: TurnMove) -> Result<String, TurnError> {
        self.clone().try_turn(mv)
    }

    pub fn algebraic_to_turn(&self, notation: &str) -> Result<TurnMove, TurnError> {
        if !self.status.is_active() {
            return Err(TurnError::GameOver);
        }
        let force = self.active_force;
        match AlgebraicTurn::parse(notation).ok_or(TurnError::InvalidNotation)? {
            AlgebraicTurn::Castle(dir) => {
                let from = home_row_coord(force, Col::E);
                let to = match dir {
                    CastleDirection::ASide => home_row_coord(force, Col::C),
                    CastleDirection::HSide => home_row_coord(force, Col::G),
                };
                Ok(TurnMove { from, to, promote_to: None })
            }
            AlgebraicTurn::Move(AlgebraicMove {
                piece_kind,
                from_col,
                from_row,
                capturing,
                to,
                promote_to,
            }) => {
                if promote_to.is_some() != should_promote(force, piece_kind, to) {
                    return Err(TurnError::BadPromotion);
                }
                let mut turn = None;
                let mut first_error = None;
                for (from, piece) in self.grid.pieces() {
                    if piece.force != force
                        || piece.kind != piece_kind
                        || from_row.is_some_and(|row| row != from.row)
                        || from_col.is_some_and(|col| col != from.col)
                    {
                        continue;
                    }
                    let mv = TurnMove { from, to, promote_to };
                    match self.turn_outcome(mv) {
                        Ok(outcome) => {
                            if capturing && outcome.capture.is_none() {
                                return Err(TurnError::CaptureNotationRequiresCapture);
                            }
                            if turn.is_some() {
                                return Err(TurnError::AmbiguousNotation);
                            }
                            turn = Some(mv);
                        }
                        Err(err) => {
                            if err != TurnError::ImpossibleTrajectory || first_error.is_none() {
                                first_error = Some(err);
                            }
                        }
                    }
                }
                turn.ok_or(first_error.unwrap_or(TurnError::ImpossibleTrajectory))
            }
        }
    }

    // Pseudo-legal moves for the active force: trajectories are valid, but the king may be
    // left in check.
    fn candidate_moves(&self) -> Vec<TurnMove> {
        let mut moves = Vec::new();
        for (from, piece) in self.grid.pieces() {
            if piece.force != self.active_force {
                continue;
            }
            for to in Coord::all() {
                let castling = castling_direction(piece, from, to).is_some();
                if !castling && !proto_reachability(&self.grid, from, to).possible() {
                    continue;
                }
                if should_promote(piece.force, piece.kind, to) {
                    for kind in PieceKind::iter().filter(|kind| kind.can_promote_to()) {
                        moves.push(TurnMove { from, to, promote_to: Some(kind) });
                    }
                } else {
                    moves.push(TurnMove { from, to, promote_to: None });
                }
            }
        }
        moves
    }

    fn turn_outcome(&self, mv: TurnMove) -> Result<TurnOutcome, TurnError> {
        if !self.status.is_active() {
            return Err(TurnError::GameOver);
        }
        let force = self.active_force;
        let piece = self.grid[mv.from].ok_or(TurnError::PieceMissing)?;
        if piece.force != force {
            return Err(TurnError::WrongTurnOrder);
        }
        let mut new_grid = self.grid.clone();
        let mut capture = None;
        let castle = castling_direction(piece, mv.from, mv.to);
        if let Some(dir) = castle {
            if mv.promote_to.is_some() {
                return Err(TurnError::BadPromotion);
            }
            if !self.castling_rights[force][dir] {
                return Err(TurnError::CastlingPieceHasMoved);
            }
            let rook_from = home_row_coord(force, castling_rook_col(dir));
            if self.grid[rook_from] != Some(PieceOnBoard::new(PieceKind::Rook, force)) {
                return Err(TurnError::CastlingPieceHasMoved);
            }
            let (col_min, col_max) = sort_two((mv.from.col, rook_from.col));
            for col in Col::all().filter(|&col| col > col_min && col < col_max) {
                if self.grid[Coord::new(mv.from.row, col)].is_some() {
                    return Err(TurnError::PathBlocked);
                }
            }
            // King cannot castle out of, through or into check.
            let (col_min, col_max) = sort_two((mv.from.col, mv.to.col));
            for col in Col::all().filter(|&col| col >= col_min && col <= col_max) {
                let mut grid = self.grid.clone();
                grid[mv.from] = None;
                grid[Coord::new(mv.from.row, col)] = Some(piece);
                if is_check_to(&grid, force) {
                    return Err(TurnError::UnprotectedKing);
                }
            }
            let rook_to = mv.from + (0, (mv.to.col - mv.from.col).signum());
            new_grid[mv.from] = None;
            new_grid[rook_from] = None;
            new_grid[mv.to] = Some(piece);
            new_grid[rook_to] = Some(PieceOnBoard::new(PieceKind::Rook, force));
        } else {
            let capture_pos = get_capture(&self.grid, mv.from, mv.to, self.en_passant_target);
            match reachability(&self.grid, mv.from, mv.to, capture_pos.is_some()) {
                Reachability::Ok => {}
                Reachability::Blocked => return Err(TurnError::PathBlocked),
                Reachability::Impossible => return Err(TurnError::ImpossibleTrajectory),
            }
            new_grid[mv.from] = None;
            if let Some(capture_pos) = capture_pos {
                capture = new_grid[capture_pos].take().map(|captured| captured.kind);
            }
            if should_promote(force, piece.kind, mv.to) {
                match mv.promote_to {
                    Some(promote_to) if promote_to.can_promote_to() => {
                        new_grid[mv.to] = Some(PieceOnBoard::new(promote_to, force));
                    }
                    _ => return Err(TurnError::BadPromotion),
                }
            } else {
                if mv.promote_to.is_some() {
                    return Err(TurnError::BadPromotion);
                }
                new_grid[mv.to] = Some(piece);
            }
        }
        if is_check_to(&new_grid, force) {
            return Err(TurnError::UnprotectedKing);
        }
        Ok(TurnOutcome {
            new_grid,
            piece_kind: piece.kind,
            capture,
            castle,
        })
    }

    fn apply_turn(&mut self, mv: TurnMove, outcome: TurnOutcome) {
        let force = self.active_force;
        let TurnOutcome { new_grid, piece_kind, capture, .. } = outcome;

        if piece_kind == PieceKind::King {
            self.castling_rights[force] = enum_map! { _ => false };
        }
        // A rook leaving its home square or being captured there ends castling on that side.
        for f in Force::iter() {
            for dir in CastleDirection::iter() {
                let rook_home = home_row_coord(f, castling_rook_col(dir));
                if mv.from == rook_home || mv.to == rook_home {
                    self.castling_rights[f][dir] = false;
                }
            }
        }

        self.en_passant_target = if piece_kind == PieceKind::Pawn && (mv.to.row - mv.from.row).abs() == 2 {
            Some(mv.from + (direction_forward(force), 0))
        } else {
            None
        };
        if piece_kind == PieceKind::Pawn || capture.is_some() {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }
        if force == Force::Black {
            self.full_move_number += 1;
        }
        self.grid = new_grid;
        self.active_force = force.opponent();
        self.record_position();
        self.status = self.compute_status();
    }

    fn record_position(&mut self) {
        // En passant only counts if there is a pawn that could capture.
        let en_passant_target = self.en_passant_target.filter(|&target| {
            let behind = -direction_forward(self.active_force);
            [-1, 1].into_iter().any(|d_col| {
                target.offset((behind, d_col)).is_some_and(|pos| {
                    self.grid[pos] == Some(PieceOnBoard::new(PieceKind::Pawn, self.active_force))
                })
            })
        });
        let position = PositionForRepetitionDraw {
            grid: self.grid.clone(),
            active_force: self.active_force,
            castling_rights: self.castling_rights,
            en_passant_target,
        };
        *self.position_count.entry(position).or_insert(0) += 1;
    }

    fn current_position_count(&self) -> u8 { self.position_count.values().copied().max().unwrap_or(0) }

    // Must be called while `self.status` is still `Active`.
    fn compute_status(&self) -> ChessGameStatus {
        let has_legal_moves =
            self.candidate_moves().into_iter().any(|mv| self.turn_outcome(mv).is_ok());
        if !has_legal_moves {
            if self.is_check() {
                ChessGameStatus::Checkmate { winner: self.active_force.opponent() }
            } else {
                ChessGameStatus::Draw(DrawReason::Stalemate)
            }
        } else if self.is_insufficient_material() {
            ChessGameStatus::Draw(DrawReason::InsufficientMaterial)
        } else if self.current_position_count() >= 3 {
            ChessGameStatus::Draw(DrawReason::ThreefoldRepetition)
        } else if self.half_move_clock >= 100 {
            ChessGameStatus::Draw(DrawReason::FiftyMoveRule)
        } else {
            ChessGameStatus::Active
        }
    }

    // Covers the standard dead positions: bare kings, a single minor piece, and any number of
    // bishops all standing on squares of the same color.
    fn is_insufficient_material(&self) -> bool {
        use PieceKind::*;
        let pieces = self.grid.pieces().filter(|(_, piece)| piece.kind != King).collect_vec();
        if pieces.iter().any(|(_, piece)| matches!(piece.kind, Pawn | Rook | Queen)) {
            return false;
        }
        match pieces.as_slice() {
            [] | [_] => true,
            _ => {
                pieces.iter().all(|(_, piece)| piece.kind == Bishop)
                    && pieces.iter().map(|(pos, _)| pos.is_light()).all_equal()
            }
        }
    }

    fn outcome_to_algebraic(&self, mv: TurnMove, outcome: &TurnOutcome) -> AlgebraicTurn {
        if let Some(dir) = outcome.castle {
            return AlgebraicTurn::Castle(dir);
        }
        let capturing = outcome.capture.is_some();
        let (from_col, from_row) = if outcome.piece_kind == PieceKind::Pawn {
            (capturing.then_some(mv.from.col), None)
        } else {
            let rivals = self
                .legal_moves()
                .into_iter()
                .filter(|other| {
                    other.to == mv.to
                        && other.from != mv.from
                        && self.grid[other.from].map(|p| p.kind) == Some(outcome.piece_kind)
                })
                .map(|other| other.from)
                .collect_vec();
            if rivals.is_empty() {
                (None, None)
            } else if rivals.iter().all(|pos| pos.col != mv.from.col) {
                (Some(mv.from.col), None)
            } else if rivals.iter().all(|pos| pos.row != mv.from.row) {
                (None, Some(mv.from.row))
            } else {
                (Some(mv.from.col), Some(mv.from.row))
            }
        };
        AlgebraicTurn::Move(AlgebraicMove {
            piece_kind: outcome.piece_kind,
            from_col,
            from_row,
            capturing,
            to: mv.to,
            promote_to: mv.promote_to,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord;
    use crate::fen::fen_to_board;
    use crate::test_util::replay_chess_log;

    fn mv(from: Coord, to: Coord) -> TurnMove { TurnMove { from, to, promote_to: None } }

    #[test]
    fn starting_position_moves() {
        let board = Board::starting_position();
        assert_eq!(board.legal_moves().len(), 20);
        assert_eq!(board.status(), ChessGameStatus::Active);
        assert!(!board.is_check());
    }

    #[test]
    fn legal_destinations() {
        let board = Board::starting_position();
        let mut dest = board.legal_destinations(coord!(g1));
        dest.sort_by_key(|c| c.to_algebraic());
        assert_eq!(dest, vec![coord!(f3), coord!(h3)]);
        assert!(board.legal_destinations(coord!(e7)).is_empty());
        assert!(board.legal_destinations(coord!(e4)).is_empty());
    }

    #[test]
    fn short_algebraic() {
        let mut board = Board::starting_position();
        assert_eq!(board.try_turn(mv(coord!(e2), coord!(e4))).unwrap(), "e4");
        assert_eq!(board.try_turn(mv(coord!(d7), coord!(d5))).unwrap(), "d5");
        assert_eq!(board.try_turn(mv(coord!(e4), coord!(d5))).unwrap(), "exd5");
        assert_eq!(board.try_turn(mv(coord!(d8), coord!(d5))).unwrap(), "Qxd5");
        assert_eq!(board.try_turn(mv(coord!(b1), coord!(c3))).unwrap(), "Nc3");
        assert_eq!(board.try_turn(mv(coord!(d5), coord!(e5))).unwrap(), "Qe5+");
    }

    #[test]
    fn disambiguation() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.a4 h6 2.h4 a6 3.Ra3 b6").unwrap();
        // Both rooks reach h3 now.
        assert_eq!(board.algebraic_to_turn("Rh3"), Err(TurnError::AmbiguousNotation));
        replay_chess_log(&mut board, "4.R1h3 c6").unwrap();
        assert_eq!(board.turn_to_algebraic(mv(coord!(a3), coord!(d3))).unwrap(), "Rad3");
        assert_eq!(board.algebraic_to_turn("Rd3"), Err(TurnError::AmbiguousNotation));
        assert_eq!(board.algebraic_to_turn("Rhd3"), Ok(mv(coord!(h3), coord!(d3))));
        assert_eq!(board.algebraic_to_turn("Rh3d3"), Ok(mv(coord!(h3), coord!(d3))));
    }

    #[test]
    fn capture_notation() {
        // Capture marks + capture = ok.
        replay_chess_log(&mut Board::starting_position(), "1.Nc3 d5 2.Nxd5").unwrap();
        replay_chess_log(&mut Board::starting_position(), "1.e4 d5 2.exd5").unwrap();

        // Capture marks + no capture = fail (capture mark requires capture).
        assert_eq!(
            replay_chess_log(&mut Board::starting_position(), "1.Nxf3").unwrap_err(),
            TurnError::CaptureNotationRequiresCapture
        );
    }

    #[test]
    fn en_passant() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.e4 Nc6 2.e5 d5").unwrap();
        assert_eq!(board.en_passant_target(), Some(coord!(d6)));
        assert_eq!(board.try_turn(mv(coord!(e5), coord!(d6))).unwrap(), "exd6");
        assert_eq!(board.grid()[coord!(d5)], None);
        assert_eq!(board.en_passant_target(), None);
    }

    #[test]
    fn en_passant_expires() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.e4 Nc6 2.e5 d5 3.Nf3 Nf6").unwrap();
        assert_eq!(
            board.try_turn(mv(coord!(e5), coord!(d6))),
            Err(TurnError::PathBlocked)
        );
    }

    #[test]
    fn castling() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.e4 e5 2.Nf3 Nc6 3.Bc4 Bc5").unwrap();
        assert_eq!(board.try_turn(mv(coord!(e1), coord!(g1))).unwrap(), "O-O");
        assert_eq!(board.grid()[coord!(f1)], Some(PieceOnBoard::new(PieceKind::Rook, Force::White)));
        assert_eq!(board.grid()[coord!(h1)], None);
        assert!(!board.castling_rights()[Force::White][CastleDirection::ASide]);
        assert!(board.castling_rights()[Force::Black][CastleDirection::HSide]);
    }

    #[test]
    fn castling_blocked() {
        let mut board = Board::starting_position();
        assert_eq!(board.algebraic_to_turn("O-O").and_then(|mv| board.try_turn(mv)), Err(TurnError::PathBlocked));
    }

    #[test]
    fn castling_after_rook_moved() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.Nf3 Nf6 2.g3 g6 3.Bg2 Bg7 4.Rg1 a6 5.Rh1 a5").unwrap();
        assert_eq!(
            board.try_turn(mv(coord!(e1), coord!(g1))),
            Err(TurnError::CastlingPieceHasMoved)
        );
    }

    #[test]
    fn castling_through_check() {
        let mut board = fen_to_board("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert_eq!(
            board.try_turn(mv(coord!(e1), coord!(g1))),
            Err(TurnError::UnprotectedKing)
        );
        assert_eq!(board.try_turn(mv(coord!(e1), coord!(c1))).unwrap(), "O-O-O");
    }

    #[test]
    fn castling_out_of_check() {
        let mut board = fen_to_board("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
        assert!(board.is_check());
        assert_eq!(board.try_turn_algebraic("O-O"), Err(TurnError::UnprotectedKing));
        assert_eq!(board.try_turn_algebraic("Kxe2").unwrap(), mv(coord!(e1), coord!(e2)));
    }

    #[test]
    fn pinned_piece() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.e4 e5 2.d4 Bb4+ 3.Nc3 a6").unwrap();
        assert_eq!(
            board.try_turn(mv(coord!(c3), coord!(d5))),
            Err(TurnError::UnprotectedKing)
        );
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.e4 e5 2.d3 Bb4+").unwrap();
        assert_eq!(
            board.try_turn(mv(coord!(g1), coord!(f3))),
            Err(TurnError::UnprotectedKing)
        );
        assert_eq!(board.try_turn(mv(coord!(c2), coord!(c3))).unwrap(), "c3");
    }

    #[test]
    fn stalemate_and_material() {
        let board = fen_to_board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(board.status(), ChessGameStatus::Draw(DrawReason::Stalemate));
        let board = fen_to_board("7k/8/6K1/8/8/8/8/6B1 b - - 0 1").unwrap();
        assert_eq!(board.status(), ChessGameStatus::Draw(DrawReason::InsufficientMaterial));
        let board = fen_to_board("7k/8/6K1/8/8/8/8/6R1 b - - 0 1").unwrap();
        assert!(board.status().is_active());
    }

    #[test]
    fn fifty_move_rule() {
        let mut board = fen_to_board("7k/8/6K1/8/8/8/8/R7 w - - 99 80").unwrap();
        assert!(board.status().is_active());
        board.try_turn(mv(coord!(a1), coord!(a2))).unwrap();
        assert_eq!(board.status(), ChessGameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn promotion() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.h4 g5 2.hxg5 Nf6 3.g6 Rg8 4.gxh7 a6").unwrap();
        assert!(board.is_promotion(coord!(h7), coord!(g8)));
        assert!(board.is_promotion(coord!(h7), coord!(h8)));
        assert!(!board.is_promotion(coord!(h7), coord!(f8)));
        assert!(!board.is_promotion(coord!(a2), coord!(a3)));
        assert_eq!(
            board.try_turn(mv(coord!(h7), coord!(g8))),
            Err(TurnError::BadPromotion)
        );
        let promote = TurnMove {
            from: coord!(h7),
            to: coord!(g8),
            promote_to: Some(PieceKind::Knight),
        };
        assert_eq!(board.try_turn(promote).unwrap(), "hxg8=N");
        assert_eq!(
            board.grid()[coord!(g8)],
            Some(PieceOnBoard::new(PieceKind::Knight, Force::White))
        );
    }

    #[test]
    fn fools_mate() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.f3 e5 2.g4").unwrap();
        assert_eq!(board.try_turn(mv(coord!(d8), coord!(h4))).unwrap(), "Qh4#");
        assert_eq!(board.status(), ChessGameStatus::Checkmate { winner: Force::Black });
        assert_eq!(board.try_turn(mv(coord!(a2), coord!(a3))), Err(TurnError::GameOver));
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn threefold_repetition() {
        let mut board = Board::starting_position();
        replay_chess_log(&mut board, "1.Nf3 Nf6 2.Ng1 Ng8 3.Nf3 Nf6 4.Ng1").unwrap();
        assert!(board.status().is_active());
        replay_chess_log(&mut board, "4...Ng8").unwrap();
        assert_eq!(board.status(), ChessGameStatus::Draw(DrawReason::ThreefoldRepetition));
    }
}
