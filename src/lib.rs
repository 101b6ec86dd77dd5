//! # Match-Three Engine Library
//!
//! This library provides the board state machine of a tile-matching puzzle: players swap
//! adjacent tokens to form runs of three or more of a kind, which are removed, replaced by
//! falling and newly created tokens, and re-evaluated until the board is stable.
//!
//! Rendering, animation and input devices live outside the library. The engine reports what
//! happened as a list of [`events::GameEvent`]s and waits for
//! [`game::Game::animation_complete`] before running the next cascade step.
//!
//! It is used by two binaries:
//! - `human_player`: Allows interactive gameplay via the command line.
//! - `simulate`: Plays seeded games automatically by always taking the hinted move, then
//!   reports score statistics.
//!
//! ## Modules
//! - `engine`: Tokens, tiles and the bounds-checked `Board`.
//! - `matcher`: Horizontal and vertical run detection (`find_matches`).
//! - `swap`: Adjacency validation and speculative swaps (`try_swap`).
//! - `cascade`: The remove, compact, refill and rescan loop (`CascadeResolver`).
//! - `hint`: Exhaustive search for a matching swap (`find_hint`).
//! - `reshuffle`: Matchless re-randomization when no move is left.
//! - `game`: The session state machine tying everything together (`Game`).
//! - `selection`: Click-to-select input state machine.
//! - `events`, `config`, `error`: Effects reported to the view, construction-time settings,
//!   and the shared error type.
//! - `utils`: Parsing boards from strings, mainly for tests.

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod hint;
pub mod matcher;
pub mod reshuffle;
pub mod selection;
pub mod swap;
pub mod utils;
