//! Swap validation and speculative application.
use crate::engine::{Board, Position};
use crate::error::EngineError;
use crate::matcher::{find_matches, MatchGroup};

/// Result of a legal swap request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The swap formed no match and was reverted; the board is unchanged.
    NoMatch,
    /// The swap formed at least one match and was kept.
    Matched(Vec<MatchGroup>),
}

impl MoveOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MoveOutcome::Matched(_))
    }
}

/// Returns `true` when `a` and `b` are orthogonal neighbours (Manhattan distance 1).
pub fn are_adjacent(a: Position, b: Position) -> bool {
    a.manhattan_distance(b) == 1
}

/// Swaps the tiles at `a` and `b` and keeps the swap only if it forms a match.
///
/// Coordinates are bounds-checked and adjacency is validated before anything is mutated:
/// out-of-range input fails with [`EngineError::OutOfBounds`], and non-adjacent input or an
/// empty slot on either side with [`EngineError::InvalidMove`]. Nothing but the presence of
/// a match decides the outcome.
///
/// # Examples
/// ```
/// use match3_engine::engine::Position;
/// use match3_engine::swap::{try_swap, MoveOutcome};
/// use match3_engine::utils::{board_from_str_array, board_to_strings};
///
/// let mut board = board_from_str_array(&["ABA", "CAD", "DCB"]).unwrap();
/// let outcome = try_swap(&mut board, Position::new(2, 0), Position::new(2, 1)).unwrap();
/// assert_eq!(outcome, MoveOutcome::NoMatch);
/// assert_eq!(board_to_strings(&board)[2], "DCB");
///
/// let outcome = try_swap(&mut board, Position::new(0, 1), Position::new(1, 1)).unwrap();
/// assert!(outcome.is_match());
/// assert_eq!(board_to_strings(&board)[0], "AAA");
/// ```
pub fn try_swap(board: &mut Board, a: Position, b: Position) -> Result<MoveOutcome, EngineError> {
    for pos in [a, b] {
        if !board.is_in_bounds(pos.row, pos.col) {
            return Err(EngineError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                width: board.width(),
                height: board.height(),
            });
        }
    }
    if !are_adjacent(a, b) || board.get(a)?.is_none() || board.get(b)?.is_none() {
        return Err(EngineError::InvalidMove { a, b });
    }

    board.swap(a, b)?;
    let groups = find_matches(board);
    if groups.is_empty() {
        board.swap(a, b)?;
        Ok(MoveOutcome::NoMatch)
    } else {
        Ok(MoveOutcome::Matched(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Axis;
    use crate::utils::{board_from_str_array, board_to_strings};

    #[test]
    fn test_non_adjacent_swap_is_rejected_without_mutation() {
        let mut board = board_from_str_array(&["ABA", "CAD", "DCB"]).unwrap();
        let before = board.clone();
        for (a, b) in [((0, 0), (0, 2)), ((0, 0), (1, 1)), ((1, 1), (1, 1))] {
            let result = try_swap(&mut board, a.into(), b.into());
            assert_eq!(
                result,
                Err(EngineError::InvalidMove {
                    a: a.into(),
                    b: b.into()
                })
            );
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_swap_with_empty_slot_is_rejected() {
        let mut board = board_from_str_array(&["AA.A", "BCDB"]).unwrap();
        let before = board.clone();
        let (tile, hole) = (Position::new(0, 3), Position::new(0, 2));
        assert_eq!(
            try_swap(&mut board, tile, hole),
            Err(EngineError::InvalidMove { a: tile, b: hole })
        );
        assert_eq!(
            try_swap(&mut board, hole, tile),
            Err(EngineError::InvalidMove { a: hole, b: tile })
        );
        assert_eq!(board_to_strings(&board), vec!["AA.A", "BCDB"]);
        assert_eq!(board, before);
    }

    #[test]
    fn test_out_of_bounds_swap() {
        let mut board = board_from_str_array(&["ABA", "CAD", "DCB"]).unwrap();
        let result = try_swap(&mut board, Position::new(2, 2), Position::new(3, 2));
        assert!(matches!(result, Err(EngineError::OutOfBounds { row: 3, .. })));
    }

    #[test]
    fn test_no_match_swap_is_reverted_exactly() {
        let mut board = board_from_str_array(&["ABCD", "BCDA", "CDAB"]).unwrap();
        let before = board.clone();
        let outcome = try_swap(&mut board, Position::new(0, 0), Position::new(0, 1)).unwrap();
        assert_eq!(outcome, MoveOutcome::NoMatch);
        assert_eq!(board.kinds_snapshot(), before.kinds_snapshot());
        // Identities and recorded positions are restored as well.
        assert_eq!(board, before);
    }

    #[test]
    fn test_spec_scenario_swap_without_match() {
        // A A B
        // C D A
        // A A B
        let mut board = board_from_str_array(&["AAB", "CDA", "AAB"]).unwrap();
        let before = board.kinds_snapshot();
        let outcome = try_swap(&mut board, Position::new(0, 0), Position::new(1, 0)).unwrap();
        // Column 0 becomes C, A, A and no line holds three of a kind.
        assert_eq!(outcome, MoveOutcome::NoMatch);
        assert_eq!(board.kinds_snapshot(), before);
    }

    #[test]
    fn test_column_match_from_swap() {
        // C A B
        // A D A
        // A A B
        let mut board = board_from_str_array(&["CAB", "ADA", "AAB"]).unwrap();
        let moved_id = board.get(Position::new(0, 1)).unwrap().unwrap().id;
        let outcome = try_swap(&mut board, Position::new(0, 0), Position::new(0, 1)).unwrap();
        let MoveOutcome::Matched(groups) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].axis, Axis::Vertical);
        assert_eq!(
            groups[0].positions(),
            vec![Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)]
        );
        assert_eq!(groups[0].members[0].tile_id, moved_id);
        assert_eq!(board_to_strings(&board), vec!["ACB", "ADA", "AAB"]);
    }

    #[test]
    fn test_adjacency() {
        assert!(are_adjacent(Position::new(1, 1), Position::new(0, 1)));
        assert!(are_adjacent(Position::new(1, 1), Position::new(1, 2)));
        assert!(!are_adjacent(Position::new(1, 1), Position::new(2, 2)));
        assert!(!are_adjacent(Position::new(1, 1), Position::new(1, 1)));
    }
}
