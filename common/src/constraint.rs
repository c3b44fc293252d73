use crate::Cell;
use std::collections::BTreeSet;
use std::fmt;

/// "Exactly `count` of `cells` are mines."
///
/// A constraint only lists cells whose status it does not know yet. When a
/// cell is resolved elsewhere it is removed with [`Constraint::mark_mine`] or
/// [`Constraint::mark_safe`], which keeps the statement true for what is left.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

/// What a single constraint proves on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion<'a> {
    /// Every listed cell is a mine.
    Mines(&'a BTreeSet<Cell>),
    /// Every listed cell is safe.
    Safes(&'a BTreeSet<Cell>),
    /// Nothing follows from this constraint alone.
    Undetermined,
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        Constraint {
            cells: cells.into_iter().collect(),
            count,
        }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty constraint carries no information and is dropped by the engine.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `count <= len`. Only fails when fed counts that contradict each other.
    pub fn is_consistent(&self) -> bool {
        self.count <= self.cells.len()
    }

    /// Removes `cell` knowing it is a mine. Returns whether the constraint changed.
    pub fn mark_mine(&mut self, cell: Cell) -> bool {
        if !self.cells.remove(&cell) {
            return false;
        }
        self.count = self.count.saturating_sub(1);
        true
    }

    /// Removes `cell` knowing it is safe. Returns whether the constraint changed.
    pub fn mark_safe(&mut self, cell: Cell) -> bool {
        self.cells.remove(&cell)
    }

    /// All cells, if every one of them must be a mine.
    ///
    /// `None` means no conclusion; an empty constraint never yields `Some`.
    pub fn known_mines(&self) -> Option<&BTreeSet<Cell>> {
        match self.conclusion() {
            Conclusion::Mines(cells) => Some(cells),
            _ => None,
        }
    }

    /// All cells, if none of them can be a mine.
    pub fn known_safes(&self) -> Option<&BTreeSet<Cell>> {
        match self.conclusion() {
            Conclusion::Safes(cells) => Some(cells),
            _ => None,
        }
    }

    pub fn conclusion(&self) -> Conclusion<'_> {
        if self.cells.is_empty() {
            Conclusion::Undetermined
        } else if self.count == 0 {
            Conclusion::Safes(&self.cells)
        } else if self.count == self.cells.len() {
            Conclusion::Mines(&self.cells)
        } else {
            Conclusion::Undetermined
        }
    }

    /// True when `self` is non-empty and its cells are strictly contained in `other`'s.
    pub fn is_strict_subset_of(&self, other: &Constraint) -> bool {
        !self.cells.is_empty()
            && self.cells.len() < other.cells.len()
            && self.cells.is_subset(&other.cells)
    }

    /// The constraint left over once `subset` is taken out of `self`:
    /// cells `self - subset`, count `self.count - subset.count`.
    pub fn subtract(&self, subset: &Constraint) -> Constraint {
        Constraint {
            cells: self.cells.difference(&subset.cells).copied().collect(),
            count: self.count.saturating_sub(subset.count),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "}} = {}", self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(usize, usize)]) -> Vec<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn test_mark_mine_shrinks_count() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1), (1, 0)]), 2);

        assert!(constraint.mark_mine(Cell::new(0, 1)));
        assert_eq!(constraint.len(), 2);
        assert_eq!(constraint.count(), 1);
        assert!(constraint.is_consistent());

        // A cell outside the constraint leaves it untouched
        assert!(!constraint.mark_mine(Cell::new(5, 5)));
        assert_eq!(constraint.count(), 1);
    }

    #[test]
    fn test_mark_safe_keeps_count() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1), (1, 0)]), 1);

        assert!(constraint.mark_safe(Cell::new(0, 0)));
        assert_eq!(constraint.len(), 2);
        assert_eq!(constraint.count(), 1);

        assert!(!constraint.mark_safe(Cell::new(0, 0)));
        assert_eq!(constraint.len(), 2);
    }

    #[test]
    fn test_known_mines() {
        let all_mines = Constraint::new(cells(&[(0, 0), (0, 1)]), 2);
        assert_eq!(all_mines.known_mines().map(BTreeSet::len), Some(2));
        assert_eq!(all_mines.known_safes(), None);

        let ambiguous = Constraint::new(cells(&[(0, 0), (0, 1)]), 1);
        assert_eq!(ambiguous.known_mines(), None);
        assert_eq!(ambiguous.known_safes(), None);
        assert_eq!(ambiguous.conclusion(), Conclusion::Undetermined);
    }

    #[test]
    fn test_known_safes() {
        let all_safe = Constraint::new(cells(&[(2, 2), (2, 3)]), 0);
        let safes = all_safe.known_safes().unwrap();
        assert!(safes.contains(&Cell::new(2, 2)));
        assert!(safes.contains(&Cell::new(2, 3)));
        assert_eq!(all_safe.known_mines(), None);
    }

    #[test]
    fn test_empty_constraint_concludes_nothing() {
        // count == len == 0 must not read as an (empty) answer
        let empty = Constraint::new(Vec::new(), 0);
        assert!(empty.is_empty());
        assert_eq!(empty.known_mines(), None);
        assert_eq!(empty.known_safes(), None);
        assert_eq!(empty.conclusion(), Conclusion::Undetermined);
    }

    #[test]
    fn test_marking_down_to_empty() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1)]), 1);
        constraint.mark_mine(Cell::new(0, 0));
        assert_eq!(constraint.known_safes().map(BTreeSet::len), Some(1));
        constraint.mark_safe(Cell::new(0, 1));
        assert!(constraint.is_empty());
        assert_eq!(constraint.count(), 0);
        assert_eq!(constraint.conclusion(), Conclusion::Undetermined);
    }

    #[test]
    fn test_strict_subset() {
        let small = Constraint::new(cells(&[(0, 0), (0, 1)]), 1);
        let large = Constraint::new(cells(&[(0, 0), (0, 1), (0, 2)]), 2);
        let same_cells = Constraint::new(cells(&[(0, 0), (0, 1)]), 0);
        let empty = Constraint::new(Vec::new(), 0);

        assert!(small.is_strict_subset_of(&large));
        assert!(!large.is_strict_subset_of(&small));
        assert!(!small.is_strict_subset_of(&same_cells));
        assert!(!small.is_strict_subset_of(&small));
        assert!(!empty.is_strict_subset_of(&large));
    }

    #[test]
    fn test_subtract() {
        let small = Constraint::new(cells(&[(0, 0), (0, 1)]), 1);
        let large = Constraint::new(cells(&[(0, 0), (0, 1), (0, 2)]), 2);

        let derived = large.subtract(&small);
        assert_eq!(derived, Constraint::new(cells(&[(0, 2)]), 1));
        assert_eq!(derived.known_mines().map(BTreeSet::len), Some(1));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = Constraint::new(cells(&[(0, 0), (1, 1)]), 1);
        let b = Constraint::new(cells(&[(1, 1), (0, 0)]), 1);
        let c = Constraint::new(cells(&[(1, 1), (0, 0)]), 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let constraint = Constraint::new(cells(&[(1, 0), (0, 1)]), 1);
        assert_eq!(constraint.to_string(), "{(0, 1), (1, 0)} = 1");
    }
}
