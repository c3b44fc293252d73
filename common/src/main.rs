use anyhow::{Context, Result};
use clap::Parser;
use minesweeper_ai::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "minesweeper-bot")]
#[command(about = "Autonomous Minesweeper player driven by logical inference")]
#[command(version)]
struct Cli {
    /// Number of rows
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Number of columns
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines
    #[arg(short, long, default_value_t = 8)]
    mines: usize,

    /// Seed for the board layout and the bot's guesses
    #[arg(short, long)]
    seed: Option<u64>,

    /// Keep the smaller constraint after subset elimination
    #[arg(long)]
    retain_subsets: bool,

    /// Pause between moves, in milliseconds
    #[arg(long, default_value_t = 300)]
    delay_ms: u64,

    /// Write the board layout to this file before playing
    #[arg(long, conflicts_with = "games")]
    save_board: Option<PathBuf>,

    /// Play a layout previously written with --save-board
    #[arg(long, conflicts_with_all = ["height", "width", "mines", "games"])]
    load_board: Option<PathBuf>,

    /// Play this many games quietly and report statistics instead
    #[arg(short, long)]
    games: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let config = EngineConfig {
        elimination: if cli.retain_subsets {
            Elimination::RetainSubset
        } else {
            Elimination::ConsumeBoth
        },
    };

    if let Some(games) = cli.games {
        return run_batch(&cli, config, games, &mut rng);
    }

    let board = match &cli.load_board {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read board from {}", path.display()))?;
            Board::deserialize(&bytes)
                .with_context(|| format!("invalid board file {}", path.display()))?
        }
        None => Board::new(cli.height, cli.width, cli.mines, &mut rng)?,
    };
    if let Some(path) = &cli.save_board {
        std::fs::write(path, board.serialize()?)
            .with_context(|| format!("failed to write board to {}", path.display()))?;
    }

    play_verbose(board, config, Duration::from_millis(cli.delay_ms), &mut rng)
}

fn play_verbose(
    board: Board,
    config: EngineConfig,
    delay: Duration,
    rng: &mut StdRng,
) -> Result<()> {
    let mut game = Game::new(board, config);

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: play proven-safe cells, guess only when nothing is proven.");
    println!(
        "Board: {}x{} with {} mines",
        game.board().height(),
        game.board().width(),
        game.board().mine_count()
    );
    println!("Elimination: {:?}", game.agent().config().elimination);
    print!("{}", game.render());

    while game.state() == GameState::Playing {
        println!("\n--- Move #{} ---", game.turns() + 1);
        let Some(turn) = game.step(rng)? else {
            println!("No cell left to choose.");
            break;
        };

        if turn.guessed {
            println!("Nothing proven safe. Guessing {}...", turn.cell);
        } else {
            println!("Revealing proven-safe cell {}...", turn.cell);
        }
        match &turn.outcome {
            Outcome::Exploded => println!("{} was a mine.", turn.cell),
            Outcome::Revealed { count, deductions } => {
                println!("{} touches {} mine(s).", turn.cell, count);
                report(deductions);
            }
        }
        print!("{}", game.render());

        if Audit::of(game.agent()).is_satisfiable()? {
            thread::sleep(delay);
        } else {
            println!("Knowledge base became contradictory; stopping.");
            break;
        }
    }

    println!("\n--- Game Over ---");
    match game.state() {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Stalled | GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    println!(
        "Moves: {} ({} guesses), constraints left: {}",
        game.turns(),
        game.guesses(),
        game.agent().constraints().len()
    );
    print!("{}", game.board());
    Ok(())
}

fn report(deductions: &Deductions) {
    if deductions.is_empty() && deductions.derived == 0 {
        return;
    }
    let list = |cells: &std::collections::BTreeSet<Cell>| {
        cells.iter().map(Cell::to_string).collect::<Vec<_>>().join(" ")
    };
    if !deductions.safes.is_empty() {
        println!("  safe:  {}", list(&deductions.safes));
    }
    if !deductions.mines.is_empty() {
        println!("  mines: {}", list(&deductions.mines));
    }
    println!(
        "  {} derived constraint(s) over {} round(s)",
        deductions.derived, deductions.rounds
    );
}

fn run_batch(cli: &Cli, config: EngineConfig, games: usize, rng: &mut StdRng) -> Result<()> {
    let mut won = 0;
    let mut guesses = 0;
    for _ in 0..games {
        let board = Board::new(cli.height, cli.width, cli.mines, rng)?;
        let mut game = Game::new(board, config);
        if game.play(rng)? == GameState::Won {
            won += 1;
        }
        guesses += game.guesses();
    }

    println!(
        "{}x{} with {} mines, {:?}",
        cli.height, cli.width, cli.mines, config.elimination
    );
    println!(
        "Won {won}/{games} ({:.1}%), {:.2} guesses per game",
        100.0 * won as f64 / games.max(1) as f64,
        guesses as f64 / games.max(1) as f64
    );
    Ok(())
}
