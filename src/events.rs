//! Effects reported to the view layer.
//!
//! Every engine operation returns the list of events it produced, in order. The view plays
//! them and calls [`crate::game::Game::animation_complete`] when it is ready for the next
//! cascade step.
use crate::engine::{Position, SpecialState, TileId, TokenKind};
use crate::matcher::MatchGroup;
use serde::Serialize;

/// A tile sliding from one slot to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TileMove {
    pub from: Position,
    pub to: Position,
    pub tile_id: TileId,
}

/// A tile appearing in a slot, either newly created or re-kinded by a reshuffle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TileCreation {
    pub position: Position,
    pub kind: TokenKind,
    pub tile_id: TileId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    /// A player swap was applied and kept.
    TilesSwapped { a: Position, b: Position },
    /// A player swap formed no match and was undone.
    SwapReverted { a: Position, b: Position },
    /// Groups consumed by one removal step and the points they earned.
    MatchResolved {
        groups: Vec<MatchGroup>,
        score_delta: u32,
    },
    /// An anchor tile survived its group and received a special state.
    SpecialFormed {
        position: Position,
        tile_id: TileId,
        special: SpecialState,
    },
    /// A special tile fired while being removed.
    SpecialDetonated {
        position: Position,
        special: SpecialState,
    },
    TilesRemoved(Vec<Position>),
    TilesMoved(Vec<TileMove>),
    TilesCreated(Vec<TileCreation>),
    CascadeComplete,
    HintAvailable { a: Position, b: Position },
    NoMoveFound,
    /// Every occupied slot received a new kind.
    Reshuffled(Vec<TileCreation>),
    ReshuffleComplete,
    LevelUp { level: u32 },
}
