//! Match detection: finds horizontal and vertical runs of three or more tiles of one kind.
//!
//! The scan always covers the whole board. Rows are scanned top to bottom, each left to
//! right, then columns left to right, each top to bottom, so the same board always yields
//! the same groups in the same order.
//!
//! Within one line, overlapping runs are merged into a single group. A horizontal and a
//! vertical group sharing a tile are reported separately; removal code must tolerate a tile
//! referenced by two groups.
use crate::engine::{Board, Position, Tile, TileId, TokenKind};
use serde::Serialize;

/// Orientation of a match group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One tile taking part in a match, captured at scan time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchMember {
    pub position: Position,
    pub tile_id: TileId,
}

/// A deduplicated run of at least three same-kind tiles along one row or column,
/// ordered by board position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchGroup {
    pub kind: TokenKind,
    pub axis: Axis,
    pub members: Vec<MatchMember>,
}

impl MatchGroup {
    fn new(kind: TokenKind, axis: Axis) -> Self {
        MatchGroup {
            kind,
            axis,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Positions of the members in scan order.
    pub fn positions(&self) -> Vec<Position> {
        self.members.iter().map(|m| m.position).collect()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.members.iter().any(|m| m.position == pos)
    }

    fn push_unique(&mut self, tile: &Tile) {
        if !self.contains(tile.position) {
            self.members.push(MatchMember {
                position: tile.position,
                tile_id: tile.id,
            });
        }
    }
}

/// Scans the full board and returns every match group, horizontal groups first.
///
/// # Examples
/// ```
/// use match3_engine::matcher::{find_matches, Axis};
/// use match3_engine::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["AAAB", "BCDA", "CDAB"]).unwrap();
/// let groups = find_matches(&board);
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].axis, Axis::Horizontal);
/// assert_eq!(groups[0].len(), 3);
/// ```
pub fn find_matches(board: &Board) -> Vec<MatchGroup> {
    let mut groups = Vec::new();

    for row in 0..board.height() {
        let line: Vec<Position> = (0..board.width()).map(|col| Position::new(row, col)).collect();
        scan_line(board, &line, Axis::Horizontal, &mut groups);
    }
    for col in 0..board.width() {
        let line: Vec<Position> = (0..board.height()).map(|row| Position::new(row, col)).collect();
        scan_line(board, &line, Axis::Vertical, &mut groups);
    }

    groups
}

/// Returns `true` when the board holds at least one match. Cheaper to read at call sites
/// that only need the yes/no answer.
pub fn has_matches(board: &Board) -> bool {
    !find_matches(board).is_empty()
}

/// Slides a three-cell window along `line`. Every window of three occupied same-kind cells
/// extends the open group; a window whose first cell is not already in the open group
/// closes it and starts a new one.
fn scan_line(board: &Board, line: &[Position], axis: Axis, out: &mut Vec<MatchGroup>) {
    let mut current: Option<MatchGroup> = None;

    for window in line.windows(3) {
        let (Some(t0), Some(t1), Some(t2)) = (
            tile_at(board, window[0]),
            tile_at(board, window[1]),
            tile_at(board, window[2]),
        ) else {
            continue;
        };
        if t0.kind != t1.kind || t1.kind != t2.kind {
            continue;
        }

        if let Some(group) = current.take() {
            if group.contains(t0.position) {
                current = Some(group);
            } else {
                out.push(group);
            }
        }
        let group = current.get_or_insert_with(|| MatchGroup::new(t0.kind, axis));
        group.push_unique(t0);
        group.push_unique(t1);
        group.push_unique(t2);
    }

    if let Some(group) = current {
        out.push(group);
    }
}

fn tile_at(board: &Board, pos: Position) -> Option<&Tile> {
    board.get(pos).ok().flatten()
}
