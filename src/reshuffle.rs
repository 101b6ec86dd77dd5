//! Full-board reshuffle used when no move is left.
//!
//! Tiles keep their identity and slot; every occupied slot gets a new uniformly random
//! kind. Layouts containing a match are rejected and re-rolled. After
//! `max_attempts` rejected layouts a fixed diagonal pattern is applied instead, which has no
//! two equal neighbours and therefore no match.
use crate::engine::{random_kind, Board, Position, TokenKind};
use crate::error::EngineError;
use crate::events::TileCreation;
use crate::matcher::has_matches;
use rand::Rng;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReshuffleReport {
    /// Random layouts drawn, the accepted one included.
    pub attempts: u32,
    pub used_fallback: bool,
    /// Final kind of every occupied slot, row-major.
    pub tiles: Vec<TileCreation>,
}

/// Re-rolls the kind of every occupied slot until the board holds no match.
///
/// # Examples
/// ```
/// use match3_engine::engine::TokenKind;
/// use match3_engine::matcher::find_matches;
/// use match3_engine::reshuffle::reshuffle;
/// use match3_engine::utils::board_from_str_array;
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
///
/// let mut board = board_from_str_array(&["AAAA", "AAAA", "AAAA"]).unwrap();
/// let kinds: Vec<TokenKind> = (0..4).map(TokenKind).collect();
/// let mut rng = SmallRng::seed_from_u64(42);
/// let report = reshuffle(&mut board, &kinds, 100, &mut rng).unwrap();
/// assert_eq!(report.tiles.len(), 12);
/// assert!(find_matches(&board).is_empty());
/// ```
pub fn reshuffle(
    board: &mut Board,
    kinds: &[TokenKind],
    max_attempts: u32,
    rng: &mut impl Rng,
) -> Result<ReshuffleReport, EngineError> {
    if kinds.len() < 2 {
        return Err(EngineError::InvalidConfig(format!(
            "reshuffle needs at least 2 kinds, got {}",
            kinds.len()
        )));
    }
    let occupied = board.all_occupied_positions();

    let (attempts, used_fallback) = match random_layout(board, &occupied, kinds, max_attempts, rng)
    {
        Ok(attempts) => (attempts, false),
        Err(EngineError::ReshuffleExhausted { attempts }) => {
            warn!(attempts, "reshuffle retries exhausted, using fallback layout");
            fallback_layout(board, &occupied, kinds)?;
            (attempts, true)
        }
        Err(e) => return Err(e),
    };
    debug!(attempts, used_fallback, "board reshuffled");

    let mut tiles = Vec::with_capacity(occupied.len());
    for position in occupied {
        if let Some(tile) = board.get(position)? {
            tiles.push(TileCreation {
                position,
                kind: tile.kind,
                tile_id: tile.id,
            });
        }
    }
    Ok(ReshuffleReport {
        attempts,
        used_fallback,
        tiles,
    })
}

fn random_layout(
    board: &mut Board,
    occupied: &[Position],
    kinds: &[TokenKind],
    max_attempts: u32,
    rng: &mut impl Rng,
) -> Result<u32, EngineError> {
    for attempt in 1..=max_attempts {
        for &pos in occupied {
            let kind = random_kind(kinds, rng)?;
            set_kind(board, pos, kind)?;
        }
        if !has_matches(board) {
            return Ok(attempt);
        }
    }
    Err(EngineError::ReshuffleExhausted {
        attempts: max_attempts,
    })
}

/// Kind `(row + col) mod n`: horizontal and vertical neighbours always differ.
fn fallback_layout(
    board: &mut Board,
    occupied: &[Position],
    kinds: &[TokenKind],
) -> Result<(), EngineError> {
    for &pos in occupied {
        set_kind(board, pos, kinds[(pos.row + pos.col) % kinds.len()])?;
    }
    Ok(())
}

fn set_kind(board: &mut Board, pos: Position, kind: TokenKind) -> Result<(), EngineError> {
    if let Some(mut tile) = board.set(pos, None)? {
        tile.kind = kind;
        board.set(pos, Some(tile))?;
    }
    Ok(())
}
