use crate::{Board, Cell, Deductions, EngineConfig, Error, KnowledgeBase, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Won,
    Lost,
    /// The agent had no cell left to choose without having won.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Revealed { count: usize, deductions: Deductions },
    Exploded,
}

/// One move of the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub cell: Cell,
    /// The move was an uninformed fallback rather than a proven-safe cell.
    pub guessed: bool,
    pub outcome: Outcome,
}

/// A board and the agent playing it.
pub struct Game {
    board: Board,
    agent: KnowledgeBase,
    state: GameState,
    revealed: BTreeMap<Cell, usize>,
    exploded: Option<Cell>,
    turns: usize,
    guesses: usize,
}

impl Game {
    pub fn new(board: Board, config: EngineConfig) -> Self {
        let agent = KnowledgeBase::with_config(board.height(), board.width(), config);
        Game {
            board,
            agent,
            state: GameState::Playing,
            revealed: BTreeMap::new(),
            exploded: None,
            turns: 0,
            guesses: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn agent(&self) -> &KnowledgeBase {
        &self.agent
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn guesses(&self) -> usize {
        self.guesses
    }

    /// Lets the agent make one move: a proven-safe cell if it has one,
    /// otherwise a random cell that is not a known mine.
    ///
    /// Returns `Ok(None)` when the agent has nothing left to choose.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<Turn>> {
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }

        let (cell, guessed) = match self.agent.safe_move() {
            Some(cell) => (cell, false),
            None => match self.agent.random_move(rng) {
                Some(cell) => (cell, true),
                None => {
                    self.state = GameState::Stalled;
                    return Ok(None);
                }
            },
        };
        self.turns += 1;
        if guessed {
            self.guesses += 1;
        }

        if self.board.is_mine(cell) {
            self.state = GameState::Lost;
            self.exploded = Some(cell);
            return Ok(Some(Turn {
                cell,
                guessed,
                outcome: Outcome::Exploded,
            }));
        }

        let count = self.board.neighbor_mine_count(cell);
        let deductions = self.agent.record_observation(cell, count)?;
        self.revealed.insert(cell, count);

        if self.board.is_won(self.agent.known_mines()) {
            self.state = GameState::Won;
        }

        Ok(Some(Turn {
            cell,
            guessed,
            outcome: Outcome::Revealed { count, deductions },
        }))
    }

    /// Steps until the game is decided.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GameState> {
        while self.state == GameState::Playing {
            self.step(rng)?;
        }
        Ok(self.state)
    }

    /// The board as the agent sees it: counts for revealed cells, `F` for
    /// known mines, `*` for the mine that ended the game, `#` otherwise.
    pub fn render(&self) -> String {
        let mut out = String::from("   ");
        for col in 0..self.board.width() {
            out.push_str(&format!("{:^3}", col));
        }
        out.push_str(&format!("\n  +{}\n", "---".repeat(self.board.width())));

        for row in 0..self.board.height() {
            out.push_str(&format!("{:^2}|", row));
            for col in 0..self.board.width() {
                let cell = Cell::new(row, col);
                let mark = if self.exploded == Some(cell) {
                    " * ".to_string()
                } else if let Some(count) = self.revealed.get(&cell) {
                    format!(" {} ", count)
                } else if self.agent.known_mines().contains(&cell) {
                    " F ".to_string()
                } else {
                    " # ".to_string()
                };
                out.push_str(&mark);
            }
            out.push('\n');
        }
        out
    }
}
