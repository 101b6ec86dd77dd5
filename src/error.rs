//! Error type shared by every engine operation.

use crate::engine::Position;
use std::fmt;

/// Errors returned by board access, swaps and the top-level [`crate::game::Game`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A coordinate outside `[0, height) x [0, width)` was used.
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    /// A swap between two cells that are not orthogonal neighbours.
    InvalidMove { a: Position, b: Position },
    /// A mutating operation was requested while another one is still in flight.
    Busy,
    /// The random reshuffle could not find a matchless layout within the retry bound.
    /// Only used inside the reshuffle module, which falls back to a fixed layout.
    ReshuffleExhausted { attempts: u32 },
    /// The configuration passed at construction is unusable.
    InvalidConfig(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                row,
                col,
                width,
                height,
            } => write!(
                f,
                "position ({row}, {col}) is outside the {width}x{height} board"
            ),
            Self::InvalidMove { a, b } => {
                write!(f, "cannot swap {a} and {b}: cells are not adjacent")
            }
            Self::Busy => write!(f, "another move is still being resolved"),
            Self::ReshuffleExhausted { attempts } => {
                write!(f, "no matchless reshuffle found after {attempts} attempts")
            }
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EngineError::OutOfBounds {
            row: 9,
            col: 2,
            width: 8,
            height: 8,
        };
        assert_eq!(err.to_string(), "position (9, 2) is outside the 8x8 board");

        let err = EngineError::InvalidMove {
            a: Position::new(0, 0),
            b: Position::new(2, 0),
        };
        assert!(err.to_string().contains("not adjacent"));
        assert_eq!(
            EngineError::Busy.to_string(),
            "another move is still being resolved"
        );
    }
}
