// Forsyth-Edwards notation. This is the position encoding handed to board widgets.

use enum_map::enum_map;
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::board::{Board, CastlingRights};
use crate::coord::{Col, Coord, Row};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{CastleDirection, PieceKind, PieceOnBoard, piece_from_ascii, piece_to_ascii};
use crate::util::as_single_char;


pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";


fn force_to_fen(force: Force) -> char {
    match force {
        Force::White => 'w',
        Force::Black => 'b',
    }
}
fn force_from_fen(s: &str) -> Result<Force, String> {
    let ch = as_single_char(s).ok_or_else(|| format!("invalid force: {}", s))?;
    match ch {
        'w' => Ok(Force::White),
        'b' => Ok(Force::Black),
        _ => Err(format!("invalid force: {}", ch)),
    }
}

fn castle_to_fen(force: Force, dir: CastleDirection) -> char {
    let ch = match dir {
        CastleDirection::ASide => 'q',
        CastleDirection::HSide => 'k',
    };
    match force {
        Force::White => ch.to_ascii_uppercase(),
        Force::Black => ch,
    }
}

fn castling_rights_to_fen(castling_rights: &CastlingRights) -> String {
    let mut s = String::new();
    for force in Force::iter() {
        for dir in CastleDirection::iter().rev() {
            if castling_rights[force][dir] {
                s.push(castle_to_fen(force, dir));
            }
        }
    }
    if s.is_empty() { "-".to_owned() } else { s }
}
fn castling_rights_from_fen(grid: &Grid, s: &str) -> Result<CastlingRights, String> {
    let mut castling_rights = enum_map! { _ => enum_map! { _ => false } };
    if s == "-" {
        return Ok(castling_rights);
    }
    for ch in s.chars() {
        let (force, dir) = Force::iter()
            .cartesian_product(CastleDirection::iter())
            .find(|&(force, dir)| castle_to_fen(force, dir) == ch)
            .ok_or_else(|| format!("invalid castling rights: {}", s))?;
        let king = PieceOnBoard::new(PieceKind::King, force);
        let king_home = if force == Force::White { "e1" } else { "e8" };
        if Coord::from_algebraic(king_home).map(|pos| grid[pos]) != Some(Some(king)) {
            return Err("cannot have castling rights when king is not in home square".to_owned());
        }
        castling_rights[force][dir] = true;
    }
    Ok(castling_rights)
}

fn en_passant_target_to_fen(en_passant_target: Option<Coord>) -> String {
    match en_passant_target {
        None => "-".to_owned(),
        Some(pos) => pos.to_algebraic(),
    }
}
fn en_passant_target_from_fen(s: &str) -> Result<Option<Coord>, String> {
    if s == "-" {
        Ok(None)
    } else {
        let pos =
            Coord::from_algebraic(s).ok_or_else(|| format!("invalid en passant target: {}", s))?;
        Ok(Some(pos))
    }
}

pub fn board_to_fen(board: &Board) -> String {
    let grid = board.grid();
    let grid_notation = Row::all()
        .rev()
        .map(|row| {
            let mut row_notation = String::new();
            let mut empty_col_count: u8 = 0;
            for col in Col::all() {
                if let Some(piece) = grid[Coord::new(row, col)] {
                    if empty_col_count > 0 {
                        row_notation.push_str(&empty_col_count.to_string());
                        empty_col_count = 0;
                    }
                    row_notation.push(piece_to_ascii(piece.kind, piece.force));
                } else {
                    empty_col_count += 1;
                }
            }
            if empty_col_count > 0 {
                row_notation.push_str(&empty_col_count.to_string());
            }
            row_notation
        })
        .join("/");

    format!(
        "{} {} {} {} {} {}",
        grid_notation,
        force_to_fen(board.active_force()),
        castling_rights_to_fen(board.castling_rights()),
        en_passant_target_to_fen(board.en_passant_target()),
        board.half_move_clock(),
        board.full_move_number()
    )
}

pub fn fen_to_board(fen: &str) -> Result<Board, String> {
    let (
        grid_notation,
        active_force_notation,
        castling_notation,
        en_passant_target_notation,
        half_move_clock,
        full_move_number,
    ) = fen
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| format!("invalid FEN: {fen}"))?;

    let mut grid = Grid::new();
    let rows = grid_notation.split('/').collect_vec();
    if rows.len() != Row::all().count() {
        return Err(format!("invalid FEN: has {} rows, expected 8", rows.len()));
    }
    for (row, row_notation) in Row::all().zip(rows.iter().rev()) {
        let mut col = 0;
        for ch in row_notation.chars() {
            if let Some(n) = ch.to_digit(10) {
                col += n as u8;
            } else if let Some(piece) = piece_from_ascii(ch) {
                let col_coord = Col::all()
                    .nth(col.into())
                    .ok_or_else(|| format!("invalid FEN: row {} is too long", row.to_algebraic()))?;
                grid[Coord::new(row, col_coord)] = Some(piece);
                col += 1;
            } else {
                return Err(format!("invalid FEN: unknown piece: {ch}"));
            }
        }
        if col as usize != Col::all().count() {
            return Err(format!(
                "invalid FEN: row {} has {} columns, expected 8",
                row.to_algebraic(),
                col
            ));
        }
    }

    let active_force = force_from_fen(active_force_notation)?;
    let castling_rights = castling_rights_from_fen(&grid, castling_notation)?;
    let en_passant_target = en_passant_target_from_fen(en_passant_target_notation)?;
    let half_move_clock = half_move_clock
        .parse::<u32>()
        .map_err(|_| format!("invalid half-move clock: {}", half_move_clock))?;
    let full_move_number = full_move_number
        .parse::<u32>()
        .map_err(|_| format!("invalid full move number: {}", full_move_number))?;

    Ok(Board::from_parts(
        grid,
        active_force,
        castling_rights,
        en_passant_target,
        half_move_clock,
        full_move_number,
    ))
}
