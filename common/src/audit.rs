//! Exhaustive check of a knowledge base with a SAT solver.
//!
//! The engine only applies two local rules, so it can miss facts that follow
//! from several constraints together. The audit encodes everything the engine
//! knows (facts and live constraints) as CNF and asks the solver which cells
//! are forced either way. Every fact the engine derives must agree with it.

use crate::{Cell, Constraint, KnowledgeBase};
use itertools::Itertools;
use std::collections::BTreeMap;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// The possible outcomes of the audit for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // Every assignment consistent with the knowledge makes it a mine.
    ForcedSafe,   // Every consistent assignment keeps it clear.
    Undetermined, // Both are possible.
}

pub struct Audit {
    solver: Solver<'static>,
    vars: BTreeMap<Cell, Var>,
}

impl Audit {
    /// Encodes the facts and live constraints of `kb`.
    pub fn of(kb: &KnowledgeBase) -> Self {
        let facts = kb
            .known_mines()
            .iter()
            .map(|&cell| (cell, true))
            .chain(kb.known_safes().iter().map(|&cell| (cell, false)));
        Self::encode(facts, kb.constraints())
    }

    /// Encodes a bare list of constraints, with no known facts.
    pub fn of_constraints<'a>(constraints: impl IntoIterator<Item = &'a Constraint>) -> Self {
        Self::encode(std::iter::empty(), constraints)
    }

    fn encode<'a>(
        facts: impl IntoIterator<Item = (Cell, bool)>,
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Self {
        let mut audit = Audit {
            solver: Solver::new(),
            vars: BTreeMap::new(),
        };
        let mut formula = CnfFormula::new();

        for (cell, is_mine) in facts {
            let lit = audit.lit(cell, is_mine);
            formula.add_clause(&[lit]);
        }
        for constraint in constraints {
            let lits: Vec<Lit> = constraint
                .cells()
                .iter()
                .map(|&cell| audit.lit(cell, true))
                .collect();
            encode_exactly(&mut formula, &lits, constraint.count());
        }

        audit.solver.add_formula(&formula);
        audit
    }

    /// The literal "`cell` is a mine" (or its negation), allocating a variable on first use.
    fn lit(&mut self, cell: Cell, is_mine: bool) -> Lit {
        let solver = &mut self.solver;
        let var = *self.vars.entry(cell).or_insert_with(|| solver.new_var());
        Lit::from_var(var, is_mine)
    }

    /// Whether any mine layout agrees with everything encoded.
    pub fn is_satisfiable(&mut self) -> anyhow::Result<bool> {
        Ok(self.solver.solve()?)
    }

    /// The forced state of every encoded cell.
    pub fn deduce(&mut self) -> anyhow::Result<BTreeMap<Cell, DeducedState>> {
        if !self.is_satisfiable()? {
            anyhow::bail!("knowledge base is contradictory");
        }

        let vars: Vec<(Cell, Var)> = self.vars.iter().map(|(&cell, &var)| (cell, var)).collect();
        let mut deductions = BTreeMap::new();
        for (cell, var) in vars {
            let mine_possible = self.possible(Lit::from_var(var, true))?;
            let safe_possible = self.possible(Lit::from_var(var, false))?;

            let state = match (mine_possible, safe_possible) {
                (true, true) => DeducedState::Undetermined,
                (true, false) => DeducedState::ForcedMine,
                (false, true) => DeducedState::ForcedSafe,
                (false, false) => anyhow::bail!("no assignment for {cell}"),
            };
            deductions.insert(cell, state);
        }
        Ok(deductions)
    }

    fn possible(&mut self, lit: Lit) -> anyhow::Result<bool> {
        self.solver.assume(&[lit]);
        let result = self.solver.solve();
        self.solver.assume(&[]);
        Ok(result?)
    }
}

/// "Exactly `k` of `lits` are true", encoded clause by clause.
///
/// Engine constraints never exceed eight cells, so enumerating combinations
/// stays small.
fn encode_exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }
    // At most k: among any k + 1 cells one is clear.
    for combo in lits.iter().copied().combinations(k + 1) {
        let clause: Vec<Lit> = combo.into_iter().map(|lit| !lit).collect();
        formula.add_clause(&clause);
    }
    // At least k: among any n - k + 1 cells one is a mine.
    for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
        formula.add_clause(&combo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(cells: &[(usize, usize)], count: usize) -> Constraint {
        Constraint::new(cells.iter().copied().map(Cell::from), count)
    }

    #[test]
    fn test_symmetric_pair_is_undetermined() {
        let constraints = [constraint(&[(0, 0), (0, 1)], 1)];
        let mut audit = Audit::of_constraints(&constraints);
        let deductions = audit.deduce().unwrap();

        assert_eq!(
            deductions.get(&Cell::new(0, 0)),
            Some(&DeducedState::Undetermined)
        );
        assert_eq!(
            deductions.get(&Cell::new(0, 1)),
            Some(&DeducedState::Undetermined)
        );
    }

    #[test]
    fn test_subset_pair_forces_mine() {
        let constraints = [
            constraint(&[(0, 0), (0, 1)], 1),
            constraint(&[(0, 0), (0, 1), (0, 2)], 2),
        ];
        let deductions = Audit::of_constraints(&constraints).deduce().unwrap();
        assert_eq!(
            deductions.get(&Cell::new(0, 2)),
            Some(&DeducedState::ForcedMine)
        );
    }

    #[test]
    fn test_overlap_beyond_subset_rule() {
        // Neither cell set contains the other, yet at most one of b, c can be a
        // mine, so a must be one and d cannot be.
        let constraints = [
            constraint(&[(0, 0), (0, 1), (0, 2)], 2),
            constraint(&[(0, 1), (0, 2), (0, 3)], 1),
        ];
        let deductions = Audit::of_constraints(&constraints).deduce().unwrap();
        assert_eq!(
            deductions.get(&Cell::new(0, 0)),
            Some(&DeducedState::ForcedMine)
        );
        assert_eq!(
            deductions.get(&Cell::new(0, 3)),
            Some(&DeducedState::ForcedSafe)
        );
        assert_eq!(
            deductions.get(&Cell::new(0, 1)),
            Some(&DeducedState::Undetermined)
        );
    }

    #[test]
    fn test_contradiction_detected() {
        let constraints = [constraint(&[(0, 0)], 1), constraint(&[(0, 0), (0, 1)], 0)];
        let mut audit = Audit::of_constraints(&constraints);
        assert!(!audit.is_satisfiable().unwrap());
        assert!(audit.deduce().is_err());

        let overfull = [constraint(&[(0, 0)], 2)];
        assert!(!Audit::of_constraints(&overfull).is_satisfiable().unwrap());
    }

    #[test]
    fn test_audit_agrees_with_engine() {
        let mut kb = KnowledgeBase::new(2, 3);
        kb.record_observation(Cell::new(1, 0), 0).unwrap();
        kb.record_observation(Cell::new(1, 1), 1).unwrap();

        let deductions = Audit::of(&kb).deduce().unwrap();
        for cell in kb.known_safes() {
            assert_eq!(deductions.get(cell), Some(&DeducedState::ForcedSafe));
        }
        assert_eq!(
            deductions.get(&Cell::new(0, 2)),
            Some(&DeducedState::Undetermined)
        );
    }
}
