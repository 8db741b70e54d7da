use derive_new::new;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::force::Force;
use crate::util::as_single_char;


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, new)]
pub struct PieceOnBoard {
    pub kind: PieceKind,
    pub force: Force,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter)]
pub enum CastleDirection {
    ASide, // a.k.a. queen side
    HSide, // a.k.a. king side
}

impl PieceKind {
    // Should not be used to construct moves in algebraic notation, because it returns a
    // non-empty name for a pawn (use `to_algebraic_for_move` instead).
    pub fn to_full_algebraic(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn to_algebraic_for_move(self) -> &'static str {
        match self {
            PieceKind::Pawn => "",
            PieceKind::Knight => "N",
            PieceKind::Bishop => "B",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
        }
    }

    pub fn from_algebraic_char(notation: char) -> Option<Self> {
        match notation {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn from_algebraic(notation: &str) -> Option<Self> {
        as_single_char(notation).and_then(Self::from_algebraic_char)
    }

    pub fn can_promote_to(self) -> bool {
        use PieceKind::*;
        match self {
            Pawn | King => false,
            Knight | Bishop | Rook | Queen => true,
        }
    }

    // Parses user promotion choice. Accepts piece letters in any case and full English names.
    // Anything else yields `None`, leaving it up to the caller to pick a default.
    pub fn from_promotion_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim().to_ascii_lowercase();
        let kind = match choice.as_str() {
            "q" | "queen" => PieceKind::Queen,
            "r" | "rook" => PieceKind::Rook,
            "b" | "bishop" => PieceKind::Bishop,
            "n" | "knight" => PieceKind::Knight,
            _ => return None,
        };
        Some(kind)
    }
}

pub fn piece_to_ascii(kind: PieceKind, force: Force) -> char {
    let ch = kind.to_full_algebraic();
    match force {
        Force::White => ch.to_ascii_uppercase(),
        Force::Black => ch.to_ascii_lowercase(),
    }
}

pub fn piece_from_ascii(ch: char) -> Option<PieceOnBoard> {
    let kind = PieceKind::from_algebraic_char(ch.to_ascii_uppercase())?;
    let force = if ch.is_ascii_uppercase() { Force::White } else { Force::Black };
    Some(PieceOnBoard::new(kind, force))
}

pub fn piece_to_pictogram(piece_kind: PieceKind, force: Force) -> char {
    use self::Force::*;
    use self::PieceKind::*;
    match (force, piece_kind) {
        (White, Pawn) => '♙',
        (White, Knight) => '♘',
        (White, Bishop) => '♗',
        (White, Rook) => '♖',
        (White, Queen) => '♕',
        (White, King) => '♔',
        (Black, Pawn) => '♟',
        (Black, Knight) => '♞',
        (Black, Bishop) => '♝',
        (Black, Rook) => '♜',
        (Black, Queen) => '♛',
        (Black, King) => '♚',
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_choice() {
        assert_eq!(PieceKind::from_promotion_choice("q"), Some(PieceKind::Queen));
        assert_eq!(PieceKind::from_promotion_choice("Knight"), Some(PieceKind::Knight));
        assert_eq!(PieceKind::from_promotion_choice(" R "), Some(PieceKind::Rook));
        assert_eq!(PieceKind::from_promotion_choice("king"), None);
        assert_eq!(PieceKind::from_promotion_choice("p"), None);
        assert_eq!(PieceKind::from_promotion_choice(""), None);
    }

    #[test]
    fn ascii() {
        assert_eq!(piece_to_ascii(PieceKind::Knight, Force::Black), 'n');
        assert_eq!(piece_from_ascii('Q'), Some(PieceOnBoard::new(PieceKind::Queen, Force::White)));
        assert_eq!(piece_from_ascii('x'), None);
    }
}
