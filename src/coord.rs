use std::fmt;
use std::ops;

use itertools::Itertools;

use crate::force::Force;


pub const NUM_ROWS: u8 = 8;
pub const NUM_COLS: u8 = 8;


// Row from a force's point of view
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SubjectiveRow {
    idx: u8, // 0-based
}

impl SubjectiveRow {
    pub const fn from_one_based(idx: u8) -> Self {
        assert!(idx >= 1 && idx <= NUM_ROWS);
        Self { idx: idx - 1 }
    }
    pub fn to_row(self, force: Force) -> Row {
        match force {
            Force::White => Row::from_zero_based(self.idx),
            Force::Black => Row::from_zero_based(NUM_ROWS - self.idx - 1),
        }
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Row {
    idx: u8, // 0-based
}

impl Row {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_ROWS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('1' as u32)?;
        (idx < NUM_ROWS as u32).then(|| Self::from_zero_based(idx as u8))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'1') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_ROWS).map(Self::from_zero_based)
    }
}

impl ops::Sub for Row {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output {
        (self.to_zero_based() as i8) - (other.to_zero_based() as i8)
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Col {
    idx: u8, // 0-based
}

impl Col {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_COLS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('a' as u32)?;
        (idx < NUM_COLS as u32).then(|| Self::from_zero_based(idx as u8))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'a') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_COLS).map(Self::from_zero_based)
    }

    pub const A: Col = Col::from_zero_based(0);
    pub const C: Col = Col::from_zero_based(2);
    pub const D: Col = Col::from_zero_based(3);
    pub const E: Col = Col::from_zero_based(4);
    pub const F: Col = Col::from_zero_based(5);
    pub const G: Col = Col::from_zero_based(6);
    pub const H: Col = Col::from_zero_based(7);
}

impl ops::Sub for Col {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output {
        (self.to_zero_based() as i8) - (other.to_zero_based() as i8)
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: Row,
    pub col: Col,
}

impl Coord {
    pub const fn new(row: Row, col: Col) -> Self { Self { row, col } }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let (col, row) = s.chars().collect_tuple()?;
        Some(Coord {
            row: Row::from_algebraic(row)?,
            col: Col::from_algebraic(col)?,
        })
    }
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.col.to_algebraic(), self.row.to_algebraic())
    }

    pub fn all() -> impl Iterator<Item = Coord> {
        Row::all().cartesian_product(Col::all()).map(|(row, col)| Coord { row, col })
    }

    // Returns `None` if the result falls off the board.
    pub fn offset(self, (d_row, d_col): (i8, i8)) -> Option<Coord> {
        let row = self.row.to_zero_based() as i8 + d_row;
        let col = self.col.to_zero_based() as i8 + d_col;
        if (0..NUM_ROWS as i8).contains(&row) && (0..NUM_COLS as i8).contains(&col) {
            Some(Coord::new(Row::from_zero_based(row as u8), Col::from_zero_based(col as u8)))
        } else {
            None
        }
    }

    // Square color parity: `true` for light squares (h1 is light).
    pub fn is_light(self) -> bool { (self.row.to_zero_based() + self.col.to_zero_based()) % 2 == 1 }
}

impl ops::Add<(i8, i8)> for Coord {
    type Output = Self;
    #[track_caller]
    fn add(self, other: (i8, i8)) -> Self::Output {
        self.offset(other).unwrap_or_else(|| panic!("{self:?} + {other:?} is out of board"))
    }
}

impl ops::Sub for Coord {
    type Output = (i8, i8);
    fn sub(self, other: Self) -> Self::Output { (self.row - other.row, self.col - other.col) }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({}{})", self.col.to_algebraic(), self.row.to_algebraic())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col.to_algebraic(), self.row.to_algebraic())
    }
}


// Test shortcut: `coord!(e4)`.
#[macro_export]
macro_rules! coord {
    ($square:ident) => {
        $crate::coord::Coord::from_algebraic(stringify!($square)).unwrap()
    };
}
