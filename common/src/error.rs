//! Error types for the agent and its board

use crate::Cell;
use thiserror::Error;

/// Errors raised when the agent or the board is handed input that does not fit the grid.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("cell {cell} is outside the {height}x{width} grid")]
    CellOutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error("count {count} at {cell} exceeds its {neighbors} neighbours")]
    CountTooLarge {
        cell: Cell,
        count: usize,
        neighbors: usize,
    },

    #[error("a {height}x{width} grid cannot hold {mines} mines (must be fewer than its cells)")]
    TooManyMines {
        height: usize,
        width: usize,
        mines: usize,
    },

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("a {height}x{width} grid has more cells than can be addressed")]
    GridTooLarge { height: usize, width: usize },

    #[error("game already over")]
    GameOver,

    #[error("board snapshot: {0}")]
    Snapshot(#[from] bcs::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
