//! Exhaustive search for a swap that forms a match.
//!
//! Every occupied slot is tried against its occupied neighbours in the order right, left,
//! down, up. A pair already tried from the other side is skipped, since swapping is symmetric.
//! Each candidate is swapped on a scratch copy, scanned, and swapped back, so the caller's
//! board is never touched. An empty result means the board is deadlocked.
use crate::engine::{Board, Position};
use crate::matcher::{find_matches, MatchGroup};

/// Neighbour offsets in search order: right, left, down, up.
const NEIGHBOURS: [(isize, isize); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// A swap that forms at least one match, with the first group it forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hint {
    pub a: Position,
    pub b: Position,
    pub group: MatchGroup,
}

/// Returns the first matching swap of two tiles in row-major, right-left-down-up order, or
/// `None` if no adjacent swap on the board forms a match.
///
/// # Examples
/// ```
/// use match3_engine::engine::Position;
/// use match3_engine::hint::find_hint;
/// use match3_engine::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["ABA", "CAD", "DCB"]).unwrap();
/// let hint = find_hint(&board).unwrap();
/// assert_eq!((hint.a, hint.b), (Position::new(0, 1), Position::new(1, 1)));
///
/// let deadlocked = board_from_str_array(&["ABC", "BCA", "CAB"]).unwrap();
/// assert!(find_hint(&deadlocked).is_none());
/// ```
pub fn find_hint(board: &Board) -> Option<Hint> {
    let mut scratch = board.clone();

    for a in board.all_occupied_positions() {
        for (dr, dc) in NEIGHBOURS {
            let Some(b) = a.offset(dr, dc) else {
                continue;
            };
            if !board.is_in_bounds(b.row, b.col) {
                continue;
            }
            // Empty slots are not swap partners; earlier slots were already tried as (b, a).
            if !matches!(board.get(b), Ok(Some(_))) || b < a {
                continue;
            }
            if scratch.swap(a, b).is_err() {
                continue;
            }
            let mut groups = find_matches(&scratch);
            // Restore the scratch copy.
            let _ = scratch.swap(a, b);
            if !groups.is_empty() {
                return Some(Hint {
                    a,
                    b,
                    group: groups.swap_remove(0),
                });
            }
        }
    }
    None
}

/// Returns `true` when at least one adjacent swap forms a match.
pub fn has_any_move(board: &Board) -> bool {
    find_hint(board).is_some()
}
