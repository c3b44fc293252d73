use crate::constraint::{Conclusion, Constraint};
use crate::{Cell, Error, Result, grid_cells};
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

/// How subset elimination treats its two operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Elimination {
    /// Replace both `A` and `B` by `B - A`.
    #[default]
    ConsumeBoth,
    /// Replace only `B` by `B - A`; `A` stays live.
    RetainSubset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub elimination: Elimination,
}

/// What a single observation taught the knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    /// Cells newly proven safe (the observed cell itself is not listed).
    pub safes: BTreeSet<Cell>,
    /// Cells newly proven to be mines.
    pub mines: BTreeSet<Cell>,
    /// Constraints produced by subset elimination and kept.
    pub derived: usize,
    /// Rounds of fact extraction plus elimination until nothing changed.
    pub rounds: usize,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.safes.is_empty() && self.mines.is_empty()
    }
}

/// The agent's knowledge about one game.
///
/// Every cell listed by a live constraint is unresolved: once a cell lands in
/// `known_safe` or `known_mine` it is removed from all constraints.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    config: EngineConfig,
    moves_made: BTreeSet<Cell>,
    known_safe: BTreeSet<Cell>,
    known_mine: BTreeSet<Cell>,
    constraints: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        Self::with_config(height, width, EngineConfig::default())
    }

    pub fn with_config(height: usize, width: usize, config: EngineConfig) -> Self {
        KnowledgeBase {
            height,
            width,
            config,
            moves_made: BTreeSet::new(),
            known_safe: BTreeSet::new(),
            known_mine: BTreeSet::new(),
            constraints: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_safes(&self) -> &BTreeSet<Cell> {
        &self.known_safe
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.known_mine
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Sum of cell counts over all live constraints. Strictly decreases with
    /// every elimination and every absorbed constraint.
    pub fn total_constraint_cells(&self) -> usize {
        self.constraints.iter().map(Constraint::len).sum()
    }

    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        cell.neighbors(self.height, self.width)
    }

    /// Records `cell` as a mine and removes it from every constraint.
    /// Returns whether the fact was new.
    pub fn mark_mine(&mut self, cell: Cell) -> bool {
        for constraint in &mut self.constraints {
            constraint.mark_mine(cell);
        }
        self.known_mine.insert(cell)
    }

    /// Records `cell` as safe and removes it from every constraint.
    /// Returns whether the fact was new.
    pub fn mark_safe(&mut self, cell: Cell) -> bool {
        for constraint in &mut self.constraints {
            constraint.mark_safe(cell);
        }
        self.known_safe.insert(cell)
    }

    /// Ingests "`cell` was revealed and touches `count` mines", then closes
    /// the knowledge base under fact extraction and subset elimination.
    ///
    /// Revealing a cell that was already played is a no-op.
    pub fn record_observation(&mut self, cell: Cell, count: usize) -> Result<Deductions> {
        if !cell.in_bounds(self.height, self.width) {
            return Err(Error::CellOutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            });
        }
        let neighbors: Vec<Cell> = self.neighbors(cell).collect();
        if count > neighbors.len() {
            return Err(Error::CountTooLarge {
                cell,
                count,
                neighbors: neighbors.len(),
            });
        }

        let mut deductions = Deductions::default();
        if !self.moves_made.insert(cell) {
            return Ok(deductions);
        }
        self.mark_safe(cell);

        // Known mines leave the constraint and take their share of the count with them.
        let flagged = neighbors
            .iter()
            .filter(|&&n| self.known_mine.contains(&n))
            .count();
        let unresolved: Vec<Cell> = neighbors
            .into_iter()
            .filter(|n| !self.is_resolved(*n))
            .collect();
        if !unresolved.is_empty() {
            self.add_constraint(Constraint::new(unresolved, count.saturating_sub(flagged)));
        }

        self.close(&mut deductions);
        Ok(deductions)
    }

    /// A known-safe cell that has not been played yet.
    pub fn safe_move(&self) -> Option<Cell> {
        self.known_safe.difference(&self.moves_made).next().copied()
    }

    /// A uniformly chosen cell that is neither played nor a known mine.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let eligible: Vec<Cell> = grid_cells(self.height, self.width)
            .filter(|cell| !self.moves_made.contains(cell) && !self.known_mine.contains(cell))
            .collect();
        eligible.choose(rng).copied()
    }

    fn is_resolved(&self, cell: Cell) -> bool {
        self.moves_made.contains(&cell)
            || self.known_mine.contains(&cell)
            || self.known_safe.contains(&cell)
    }

    /// Adds a constraint unless it is empty or already live.
    fn add_constraint(&mut self, constraint: Constraint) -> bool {
        if constraint.is_empty() || self.constraints.contains(&constraint) {
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    /// Runs both inference rules until a full round changes nothing.
    fn close(&mut self, deductions: &mut Deductions) {
        loop {
            deductions.rounds += 1;
            let absorbed = self.absorb_conclusions(deductions);
            let eliminated = self.eliminate_subsets(deductions);
            if !absorbed && eliminated == 0 {
                break;
            }
        }
    }

    /// Turns every degenerate constraint into facts, then drops the
    /// constraints left empty (and any duplicates the marks produced).
    fn absorb_conclusions(&mut self, deductions: &mut Deductions) -> bool {
        let conclusions: Vec<(bool, Vec<Cell>)> = self
            .constraints
            .iter()
            .filter_map(|constraint| match constraint.conclusion() {
                Conclusion::Mines(cells) => Some((true, cells.iter().copied().collect())),
                Conclusion::Safes(cells) => Some((false, cells.iter().copied().collect())),
                Conclusion::Undetermined => None,
            })
            .collect();

        for (mines, cells) in &conclusions {
            for &cell in cells {
                if *mines {
                    if self.mark_mine(cell) {
                        deductions.mines.insert(cell);
                    }
                } else if self.mark_safe(cell) {
                    deductions.safes.insert(cell);
                }
            }
        }

        self.constraints = std::mem::take(&mut self.constraints)
            .into_iter()
            .filter(|constraint| !constraint.is_empty())
            .unique()
            .collect();

        !conclusions.is_empty()
    }

    /// One pass of subset elimination over a snapshot of the live constraints.
    /// A constraint takes part in at most one elimination as the consumed
    /// operand per pass. Returns the number of eliminations performed.
    fn eliminate_subsets(&mut self, deductions: &mut Deductions) -> usize {
        let snapshot = std::mem::take(&mut self.constraints);
        let mut consumed = vec![false; snapshot.len()];
        let mut derived = Vec::new();

        for (i, j) in (0..snapshot.len()).tuple_combinations() {
            if consumed[i] || consumed[j] {
                continue;
            }
            let (subset, superset) = if snapshot[i].is_strict_subset_of(&snapshot[j]) {
                (i, j)
            } else if snapshot[j].is_strict_subset_of(&snapshot[i]) {
                (j, i)
            } else {
                continue;
            };

            derived.push(snapshot[superset].subtract(&snapshot[subset]));
            consumed[superset] = true;
            if self.config.elimination == Elimination::ConsumeBoth {
                consumed[subset] = true;
            }
        }

        let eliminated = derived.len();
        self.constraints = snapshot
            .into_iter()
            .zip(consumed)
            .filter_map(|(constraint, used)| (!used).then_some(constraint))
            .collect();
        for constraint in derived {
            if self.add_constraint(constraint) {
                deductions.derived += 1;
            }
        }
        eliminated
    }
}
