use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::coord::{Col, Coord, Row};
use crate::piece::{CastleDirection, PieceKind};
use crate::util::as_single_char;


lazy_static! {
    static ref MOVE_RE: Regex =
        Regex::new(r"^([A-Z])?([a-h])?([1-8])?([x×:])?([a-h][1-8])(?:[=/]?([A-Z])?)([+†#‡]?)$")
            .unwrap();
    static ref A_CASTLING_RE: Regex = Regex::new("^(0-0-0|O-O-O)[+#]?$").unwrap();
    static ref H_CASTLING_RE: Regex = Regex::new("^(0-0|O-O)[+#]?$").unwrap();
}


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AlgebraicMove {
    pub piece_kind: PieceKind,
    pub from_col: Option<Col>,
    pub from_row: Option<Row>,
    pub capturing: bool,
    pub to: Coord,
    pub promote_to: Option<PieceKind>,
}

// Parsed algebraic notation. Conversion between `AlgebraicTurn` and string can be done
// without a board. Conversion between `AlgebraicTurn` and `TurnMove` requires a board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AlgebraicTurn {
    Move(AlgebraicMove),
    Castle(CastleDirection),
}

impl AlgebraicTurn {
    pub fn parse(notation: &str) -> Option<Self> {
        let notation = notation.trim();
        if let Some(cap) = MOVE_RE.captures(notation) {
            let piece_kind = match cap.get(1) {
                None => PieceKind::Pawn,
                Some(m) => PieceKind::from_algebraic(m.as_str())?,
            };
            let from_col = match cap.get(2) {
                None => None,
                Some(m) => Some(Col::from_algebraic(as_single_char(m.as_str())?)?),
            };
            let from_row = match cap.get(3) {
                None => None,
                Some(m) => Some(Row::from_algebraic(as_single_char(m.as_str())?)?),
            };
            let capturing = cap.get(4).is_some();
            let to = Coord::from_algebraic(cap.get(5)?.as_str())?;
            let promote_to = match cap.get(6) {
                None => None,
                Some(m) => Some(PieceKind::from_algebraic(m.as_str())?),
            };
            // Check and mate marks are accepted, but not verified: the board recomputes them.
            Some(AlgebraicTurn::Move(AlgebraicMove {
                piece_kind,
                from_col,
                from_row,
                capturing,
                to,
                promote_to,
            }))
        } else if A_CASTLING_RE.is_match(notation) {
            Some(AlgebraicTurn::Castle(CastleDirection::ASide))
        } else if H_CASTLING_RE.is_match(notation) {
            Some(AlgebraicTurn::Castle(CastleDirection::HSide))
        } else {
            None
        }
    }

    // Formats the turn without check or mate mark.
    pub fn format(&self) -> String {
        match self {
            AlgebraicTurn::Move(mv) => {
                let mut from = String::new();
                if let Some(col) = mv.from_col {
                    from.push(col.to_algebraic())
                };
                if let Some(row) = mv.from_row {
                    from.push(row.to_algebraic())
                };
                let promotion = match mv.promote_to {
                    Some(piece_kind) => format!("={}", piece_kind.to_full_algebraic()),
                    None => String::new(),
                };
                format!(
                    "{}{}{}{}{}",
                    mv.piece_kind.to_algebraic_for_move(),
                    from,
                    if mv.capturing { "x" } else { "" },
                    mv.to.to_algebraic(),
                    promotion,
                )
            }
            AlgebraicTurn::Castle(dir) => match dir {
                CastleDirection::ASide => "O-O-O".to_owned(),
                CastleDirection::HSide => "O-O".to_owned(),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord;

    #[test]
    fn parse_move() {
        assert_eq!(
            AlgebraicTurn::parse("Nbxd7+"),
            Some(AlgebraicTurn::Move(AlgebraicMove {
                piece_kind: PieceKind::Knight,
                from_col: Some(Col::from_algebraic('b').unwrap()),
                from_row: None,
                capturing: true,
                to: coord!(d7),
                promote_to: None,
            }))
        );
        assert_eq!(
            AlgebraicTurn::parse("e8=Q#"),
            Some(AlgebraicTurn::Move(AlgebraicMove {
                piece_kind: PieceKind::Pawn,
                from_col: None,
                from_row: None,
                capturing: false,
                to: coord!(e8),
                promote_to: Some(PieceKind::Queen),
            }))
        );
    }

    #[test]
    fn parse_castling() {
        assert_eq!(AlgebraicTurn::parse("O-O"), Some(AlgebraicTurn::Castle(CastleDirection::HSide)));
        assert_eq!(AlgebraicTurn::parse("0-0-0"), Some(AlgebraicTurn::Castle(CastleDirection::ASide)));
    }

    #[test]
    fn parse_garbage() {
        assert_eq!(AlgebraicTurn::parse(""), None);
        assert_eq!(AlgebraicTurn::parse("Zz9"), None);
        assert_eq!(AlgebraicTurn::parse("Xe4"), None);
    }

    #[test]
    fn format() {
        let mv = AlgebraicTurn::parse("exd8=N").unwrap();
        assert_eq!(mv.format(), "exd8=N");
        assert_eq!(AlgebraicTurn::parse("Rad1+").unwrap().format(), "Rad1");
    }
}
