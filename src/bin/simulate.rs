use anyhow::{Context, Result};
use clap::Parser;
use match3_engine::config::GameConfig;
use match3_engine::events::GameEvent;
use match3_engine::game::Game;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Play seeded games by always taking the hinted move",
    long_about = None
)]
struct Args {
    /// Number of games to simulate
    #[clap(short, long, default_value_t = 20)]
    games: u64,

    /// Moves played per game
    #[clap(short, long, default_value_t = 50)]
    moves: u32,

    /// Seed of the first game; game `i` uses `start_seed + i`
    #[clap(short, long, default_value_t = 0)]
    start_seed: u64,

    /// JSON configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct GameSummary {
    score: u32,
    level: u32,
    moves: u32,
    reshuffles: u32,
    specials: u32,
}

fn tally(summary: &mut GameSummary, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Reshuffled(_) => summary.reshuffles += 1,
            GameEvent::SpecialFormed { .. } => summary.specials += 1,
            _ => {}
        }
    }
}

fn play_one(config: GameConfig, seed: u64, max_moves: u32) -> Result<GameSummary> {
    let mut game = Game::with_seed(config, seed)?;
    let mut summary = GameSummary::default();

    // Deadlocks cost a turn without a move; cap them so a pathological kind set still ends.
    let max_turns = max_moves.saturating_mul(4);
    let mut turns = 0;
    while game.moves() < max_moves && turns < max_turns {
        turns += 1;
        let events = game.suggest()?;
        tally(&mut summary, &events);
        let hinted = events.iter().find_map(|event| match event {
            GameEvent::HintAvailable { a, b } => Some((*a, *b)),
            _ => None,
        });

        match hinted {
            Some((a, b)) => {
                let events = game.request_swap(a, b)?;
                if matches!(events.first(), Some(GameEvent::SwapReverted { .. })) {
                    warn!(seed, %a, %b, "hinted swap formed no match");
                    break;
                }
            }
            None => info!(seed, moves = game.moves(), "deadlock, board reshuffled"),
        }
        let events = game.settle()?;
        tally(&mut summary, &events);
    }

    game.teardown();
    summary.score = game.score();
    summary.level = game.level();
    summary.moves = game.moves();
    Ok(summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            GameConfig::from_json_str(&content)?
        }
        None => GameConfig::default(),
    };

    println!(
        "Simulating {} games of {} moves on a {}x{} board with {} kinds...",
        args.games,
        args.moves,
        config.width,
        config.height,
        config.kinds.len()
    );

    let mut summaries = Vec::new();
    for game_idx in 0..args.games {
        let seed = args.start_seed + game_idx;
        let summary = play_one(config.clone(), seed, args.moves)
            .with_context(|| format!("Game with seed {} failed", seed))?;
        println!(
            "  Seed: {:<6} Score: {:<7} Level: {:<3} Moves: {:<4} Reshuffles: {:<3} Specials: {}",
            seed, summary.score, summary.level, summary.moves, summary.reshuffles, summary.specials
        );
        summaries.push(summary);
    }

    if summaries.is_empty() {
        println!("No games played.");
        return Ok(());
    }

    let count = summaries.len() as f64;
    let average = |f: fn(&GameSummary) -> u32| {
        summaries.iter().map(|s| f(s) as f64).sum::<f64>() / count
    };

    println!("\n--- Simulation Complete ---");
    println!("Average Score      = {:.2}", average(|s| s.score));
    println!("Average Level      = {:.2}", average(|s| s.level));
    println!("Average Reshuffles = {:.2}", average(|s| s.reshuffles));
    println!("Average Specials   = {:.2}", average(|s| s.specials));
    Ok(())
}
