use std::ops;

use crate::coord::{Coord, NUM_COLS, NUM_ROWS};
use crate::piece::PieceOnBoard;


#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Grid {
    data: [[Option<PieceOnBoard>; NUM_COLS as usize]; NUM_ROWS as usize],
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            data: [[None; NUM_COLS as usize]; NUM_ROWS as usize],
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Coord, PieceOnBoard)> + '_ {
        Coord::all().filter_map(|pos| self[pos].map(|piece| (pos, piece)))
    }
}

impl ops::Index<Coord> for Grid {
    type Output = Option<PieceOnBoard>;
    fn index(&self, pos: Coord) -> &Self::Output {
        &self.data[pos.row.to_zero_based() as usize][pos.col.to_zero_based() as usize]
    }
}

impl ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, pos: Coord) -> &mut Self::Output {
        &mut self.data[pos.row.to_zero_based() as usize][pos.col.to_zero_based() as usize]
    }
}
