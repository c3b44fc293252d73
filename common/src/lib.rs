//! A knowledge-based Minesweeper agent.
//!
//! The agent keeps its knowledge as a list of [`Constraint`]s ("exactly `n` of
//! these cells are mines") and closes that list under two rules after every
//! observation: degenerate constraints become facts, and a constraint whose
//! cells are a strict subset of another's is subtracted from it.
//!
//! The [`Board`] and [`Game`] types are the environment the agent plays
//! against. The agent itself never looks at mine locations.

use itertools::iproduct;
use std::fmt;

pub mod audit;
pub mod board;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod game;

pub use audit::{Audit, DeducedState};
pub use board::Board;
pub use constraint::{Conclusion, Constraint};
pub use engine::{Deductions, Elimination, EngineConfig, KnowledgeBase};
pub use error::{Error, Result};
pub use game::{Game, GameState, Outcome, Turn};

/// A position on the board, addressed by row then column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Whether the cell lies on a `height` x `width` grid.
    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }

    /// All cells touching this one (up to 8), clipped to the grid.
    /// The cell itself is never included.
    pub fn neighbors(self, height: usize, width: usize) -> impl Iterator<Item = Cell> {
        iproduct!(-1isize..=1, -1isize..=1)
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |(dr, dc)| {
                let row = self.row.checked_add_signed(dr)?;
                let col = self.col.checked_add_signed(dc)?;
                Some(Cell { row, col }).filter(|cell| cell.in_bounds(height, width))
            })
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Every cell of a `height` x `width` grid in row-major order.
pub fn grid_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    iproduct!(0..height, 0..width).map(Cell::from)
}
