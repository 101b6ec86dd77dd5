//! Player tile selection, kept apart from the board.
//!
//! `NoSelection -> OneSelected -> Resolving -> NoSelection`. The first click selects a
//! tile, clicking it again clears the selection, and clicking any other tile turns the pair
//! into a swap request. While the request is resolving further clicks are ignored.
use crate::engine::Position;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoSelection,
    OneSelected(Position),
    Resolving { a: Position, b: Position },
}

/// What a click asks the engine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(Position),
    Deselected,
    SwapRequested { a: Position, b: Position },
    /// A swap is still resolving; the click was dropped.
    Ignored,
}

impl Selection {
    pub fn click(&mut self, pos: Position) -> SelectionOutcome {
        match *self {
            Selection::NoSelection => {
                *self = Selection::OneSelected(pos);
                SelectionOutcome::Selected(pos)
            }
            Selection::OneSelected(first) if first == pos => {
                *self = Selection::NoSelection;
                SelectionOutcome::Deselected
            }
            Selection::OneSelected(first) => {
                *self = Selection::Resolving { a: first, b: pos };
                SelectionOutcome::SwapRequested { a: first, b: pos }
            }
            Selection::Resolving { .. } => SelectionOutcome::Ignored,
        }
    }

    /// Returns to `NoSelection` once the engine has finished with the request.
    pub fn reset(&mut self) {
        *self = Selection::NoSelection;
    }

    pub fn selected(&self) -> Option<Position> {
        match *self {
            Selection::OneSelected(pos) => Some(pos),
            _ => None,
        }
    }
}
