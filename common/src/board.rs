use crate::{Cell, Error, Result, grid_cells};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;

/// The hidden mine layout the agent plays against.
///
/// Only the game driver consults it; the agent learns about it exclusively
/// through the neighbour counts of the cells it reveals.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    mines: BTreeSet<Cell>,
}

impl Board {
    /// Places `mines` mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let cells = Self::check_dimensions(height, width, mines)?;
        let layout = rand::seq::index::sample(rng, cells, mines)
            .into_iter()
            .map(|index| Cell::new(index / width, index % width))
            .collect();
        Ok(Board {
            height,
            width,
            mines: layout,
        })
    }

    /// A board with an explicit mine layout.
    pub fn from_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> Result<Self> {
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        Self::check_dimensions(height, width, mines.len())?;
        if let Some(&cell) = mines.iter().find(|cell| !cell.in_bounds(height, width)) {
            return Err(Error::CellOutOfBounds {
                cell,
                height,
                width,
            });
        }
        Ok(Board {
            height,
            width,
            mines,
        })
    }

    /// Validates the grid and returns its number of cells.
    fn check_dimensions(height: usize, width: usize, mines: usize) -> Result<usize> {
        if height == 0 || width == 0 {
            return Err(Error::EmptyGrid);
        }
        let cells = height
            .checked_mul(width)
            .ok_or(Error::GridTooLarge { height, width })?;
        if mines >= cells {
            return Err(Error::TooManyMines {
                height,
                width,
                mines,
            });
        }
        Ok(cells)
    }

    /// Restores a layout written by [`Board::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let board: Board = bcs::from_bytes(bytes)?;
        Self::from_mines(board.height, board.width, board.mines)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.height, self.width)
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines touching `cell`, not counting the cell itself.
    pub fn neighbor_mine_count(&self, cell: Cell) -> usize {
        cell.neighbors(self.height, self.width)
            .filter(|neighbor| self.is_mine(*neighbor))
            .count()
    }

    /// The game is won once the flagged cells are exactly the mines.
    pub fn is_won(&self, flags: &BTreeSet<Cell>) -> bool {
        *flags == self.mines
    }

    /// Cells that are not mines.
    pub fn safe_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        grid_cells(self.height, self.width).filter(|cell| !self.is_mine(*cell))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "--".repeat(self.width) + "-";
        for row in 0..self.height {
            writeln!(f, "{rule}")?;
            for col in 0..self.width {
                let mark = if self.is_mine(Cell::new(row, col)) { 'X' } else { ' ' };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::new(8, 8, 10, &mut rng).unwrap();
        assert_eq!(board.mine_count(), 10);
        assert!(board.mines().iter().all(|&cell| board.contains(cell)));
        assert_eq!(board.safe_cells().count(), 54);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            Board::new(3, 3, 9, &mut rng),
            Err(Error::TooManyMines { mines: 9, .. })
        ));
        assert!(matches!(Board::new(0, 3, 0, &mut rng), Err(Error::EmptyGrid)));
        assert!(matches!(
            Board::from_mines(2, 2, [Cell::new(2, 2)]),
            Err(Error::CellOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_unaddressable_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            Board::new(usize::MAX, 2, 0, &mut rng),
            Err(Error::GridTooLarge { width: 2, .. })
        ));

        // A snapshot is untrusted input; its dimensions go through the same check
        let oversized = Board {
            height: usize::MAX,
            width: 2,
            mines: BTreeSet::new(),
        };
        let bytes = bcs::to_bytes(&oversized).unwrap();
        assert!(matches!(
            Board::deserialize(&bytes),
            Err(Error::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_neighbor_mine_count() {
        let board = Board::from_mines(3, 3, [Cell::new(0, 0), Cell::new(2, 2)]).unwrap();
        assert_eq!(board.neighbor_mine_count(Cell::new(1, 1)), 2);
        assert_eq!(board.neighbor_mine_count(Cell::new(0, 1)), 1);
        assert_eq!(board.neighbor_mine_count(Cell::new(2, 0)), 0);
        // A mine does not count itself
        assert_eq!(board.neighbor_mine_count(Cell::new(0, 0)), 0);
    }

    #[test]
    fn test_is_won() {
        let board = Board::from_mines(2, 2, [Cell::new(1, 1)]).unwrap();
        assert!(!board.is_won(&BTreeSet::new()));
        assert!(!board.is_won(&BTreeSet::from([Cell::new(1, 1), Cell::new(0, 0)])));
        assert!(board.is_won(&BTreeSet::from([Cell::new(1, 1)])));
    }

    #[test]
    fn test_snapshot() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = Board::new(5, 4, 6, &mut rng).unwrap();
        let bytes = board.serialize().unwrap();
        assert_eq!(Board::deserialize(&bytes).unwrap(), board);
        assert!(matches!(
            Board::deserialize(&[0xff]),
            Err(Error::Snapshot(_))
        ));
    }

    #[test]
    fn test_display() {
        let board = Board::from_mines(1, 2, [Cell::new(0, 1)]).unwrap();
        assert_eq!(board.to_string(), "-----\n| |X|\n-----\n");
    }
}
