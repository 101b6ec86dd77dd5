use anyhow::{Context, Result};
use clap::Parser;
use match3_engine::config::GameConfig;
use match3_engine::engine::{Position, TokenKind};
use match3_engine::events::GameEvent;
use match3_engine::game::Game;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play the match-three puzzle in the terminal", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible game
    #[clap(short, long)]
    seed: Option<u64>,

    /// Board width
    #[clap(long)]
    width: Option<usize>,

    /// Board height
    #[clap(long)]
    height: Option<usize>,

    /// Number of token kinds
    #[clap(short, long)]
    kinds: Option<u8>,
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            GameConfig::from_json_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(kinds) = args.kinds {
        config.kinds = (0..kinds).map(TokenKind).collect();
    }
    config.validate()?;
    Ok(config)
}

/// Prints a one-line summary of each event, standing in for the animation layer.
fn describe(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::SwapReverted { a, b } => println!("No match: {} and {} swap back.", a, b),
            GameEvent::MatchResolved { groups, score_delta } => {
                println!("Matched {} group(s) for +{} points.", groups.len(), score_delta)
            }
            GameEvent::SpecialFormed {
                position, special, ..
            } => println!("Special tile {:?} formed at {}.", special, position),
            GameEvent::SpecialDetonated { position, special } => {
                println!("Special tile {:?} at {} detonated!", special, position)
            }
            GameEvent::HintAvailable { a, b } => println!("Hint: try swapping {} and {}.", a, b),
            GameEvent::NoMoveFound => println!("No moves left, reshuffling..."),
            GameEvent::LevelUp { level } => println!("🎉 Level {} reached! 🎉", level),
            _ => {}
        }
    }
}

fn parse_position(row: &str, col: &str) -> Option<Position> {
    Some(Position::new(row.parse().ok()?, col.parse().ok()?))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut game = match args.seed {
        Some(seed) => Game::with_seed(config, seed)?,
        None => Game::new(config)?,
    };
    println!("Welcome to Match Three!");

    let mut last_input = Instant::now();
    loop {
        println!("---------------------");
        println!(
            "Level: {}, Moves: {}, Score: {}",
            game.level(),
            game.moves(),
            game.score()
        );
        let highlight: Vec<Position> = match (game.selection().selected(), game.current_hint()) {
            (Some(pos), _) => vec![pos],
            (None, Some(hint)) => vec![hint.a, hint.b],
            (None, None) => Vec::new(),
        };
        println!("{}", game.board().to_string_with_highlight(&highlight));

        print!(
            "Enter 'row col' to select, 'r1 c1 r2 c2' to swap, 'h' hint, 's' shuffle, 'q' quit: "
        );
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Error reading input. Please try again.");
            continue;
        }

        // Time spent at the prompt counts as idle time.
        let idle_events = game.tick(last_input.elapsed())?;
        describe(&idle_events);
        describe(&game.settle()?);
        last_input = Instant::now();

        let parts: Vec<&str> = input.split_whitespace().collect();
        let result = match parts.as_slice() {
            ["q"] => {
                game.teardown();
                println!("Final Score: {}", game.score());
                println!("Thanks for playing!");
                break;
            }
            ["h"] => game.suggest(),
            ["s"] => game.reshuffle(),
            [r, c] => match parse_position(r, c) {
                Some(pos) => game.select(pos),
                None => {
                    println!("Invalid input: row and column must be numbers.");
                    continue;
                }
            },
            [r1, c1, r2, c2] => match (parse_position(r1, c1), parse_position(r2, c2)) {
                (Some(a), Some(b)) => game.request_swap(a, b),
                _ => {
                    println!("Invalid input: coordinates must be numbers.");
                    continue;
                }
            },
            _ => {
                println!("Invalid input format.");
                continue;
            }
        };

        match result {
            Ok(events) => {
                describe(&events);
                describe(&game.settle()?);
            }
            Err(e) => println!("Move rejected: {}", e),
        }
    }
    Ok(())
}
