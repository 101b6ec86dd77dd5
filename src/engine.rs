//! Core board model for the match-three puzzle.
//!
//! This module defines the game's fundamental components:
//! - `TokenKind`: the category two tiles must share to match.
//! - `Tile`: a token on the board with a stable identity and an optional special state.
//! - `Board`: the fixed-size grid of slots. Every read and write is bounds-checked and
//!   every mutation goes through [`Board::set`].
use crate::error::EngineError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a token. Two tiles match when their kinds are equal; kinds carry no ordering
/// semantics beyond that.
///
/// Kinds are rendered as upper-case letters, `TokenKind(0)` being `'A'`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenKind(pub u8);

impl TokenKind {
    /// Converts the kind to its character representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_engine::engine::TokenKind;
    /// assert_eq!(TokenKind(0).to_char(), 'A');
    /// assert_eq!(TokenKind(5).to_char(), 'F');
    /// ```
    pub fn to_char(self) -> char {
        (b'A' + self.0 % 26) as char
    }

    /// Parses an upper-case letter back into a kind.
    pub fn from_char(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() {
            Some(TokenKind(c as u8 - b'A'))
        } else {
            None
        }
    }

    /// Returns the ANSI background color code used by the terminal renderer.
    fn to_ansi_color_code(self) -> &'static str {
        match self.0 % 6 {
            0 => "41",
            1 => "42",
            2 => "43",
            3 => "44",
            4 => "45",
            _ => "46",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Effect carried by a tile that was the anchor of a match of four or more.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialState {
    #[default]
    None,
    /// Clears its whole row when removed. Formed by a horizontal group of four.
    RowClear,
    /// Clears its whole column when removed. Formed by a vertical group of four.
    ColClear,
    /// Clears its row and column when removed. Formed by a group of five or more.
    Explosive,
}

impl SpecialState {
    /// Marker printed next to the kind letter by the board renderer.
    pub fn marker(self) -> char {
        match self {
            SpecialState::None => ' ',
            SpecialState::RowClear => '-',
            SpecialState::ColClear => '|',
            SpecialState::Explosive => '*',
        }
    }
}

/// Stable identity of a tile. Unique within one board for the lifetime of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A `(row, col)` coordinate. Row 0 is the top of the board.
///
/// Ordering is row-major, which is also the scan order used by the match and hint searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns the neighbouring coordinate `(row + dr, col + dc)`, or `None` when it would
    /// be negative. The upper bound is the board's concern.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Position> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Some(Position { row, col })
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan_distance(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A token occupying one slot.
///
/// `position` mirrors the slot the tile currently sits in and is rewritten by
/// [`Board::set`]; the identity of a tile is its `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: TileId,
    pub kind: TokenKind,
    pub position: Position,
    pub special: SpecialState,
}

/// The game board: a `width x height` grid of slots, each holding a [`Tile`] or nothing.
///
/// Dimensions are fixed at construction. Cells are stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<Tile>>,
    next_tile_id: u64,
}

impl Board {
    /// Creates a board of the given size with every slot empty.
    ///
    /// # Examples
    /// ```
    /// use match3_engine::engine::{Board, Position};
    /// let board = Board::new_empty(4, 3);
    /// assert_eq!(board.width(), 4);
    /// assert_eq!(board.height(), 3);
    /// assert_eq!(board.get(Position::new(2, 3)).unwrap(), None);
    /// assert!(board.get(Position::new(3, 0)).is_err());
    /// ```
    pub fn new_empty(width: usize, height: usize) -> Self {
        Board {
            width,
            height,
            cells: vec![None; width * height],
            next_tile_id: 0,
        }
    }

    /// Creates a board where every slot holds a new tile of a uniformly chosen kind.
    ///
    /// The result may contain matches; callers that need a matchless start run
    /// [`crate::reshuffle::reshuffle`] afterwards.
    pub fn new_random(
        width: usize,
        height: usize,
        kinds: &[TokenKind],
        rng: &mut impl Rng,
    ) -> Result<Self, EngineError> {
        let mut board = Board::new_empty(width, height);
        for pos in board.positions() {
            let kind = random_kind(kinds, rng)?;
            board.place_new(pos, kind)?;
        }
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` when `(row, col)` lies inside the grid.
    pub fn is_in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    fn index(&self, pos: Position) -> Result<usize, EngineError> {
        if self.is_in_bounds(pos.row, pos.col) {
            Ok(pos.row * self.width + pos.col)
        } else {
            Err(EngineError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Returns the tile at `pos`, `None` for an empty slot.
    pub fn get(&self, pos: Position) -> Result<Option<&Tile>, EngineError> {
        let idx = self.index(pos)?;
        Ok(self.cells[idx].as_ref())
    }

    /// Returns the kind of the tile at `pos`, `None` for an empty slot.
    pub fn kind_at(&self, pos: Position) -> Result<Option<TokenKind>, EngineError> {
        Ok(self.get(pos)?.map(|tile| tile.kind))
    }

    /// Writes `tile` (or emptiness) into the slot at `pos` and returns what was there.
    ///
    /// This is the only way the grid is mutated. A placed tile has its `position` updated
    /// to `pos`.
    pub fn set(&mut self, pos: Position, tile: Option<Tile>) -> Result<Option<Tile>, EngineError> {
        let idx = self.index(pos)?;
        let tile = tile.map(|mut t| {
            t.position = pos;
            t
        });
        Ok(std::mem::replace(&mut self.cells[idx], tile))
    }

    /// Creates a fresh tile of `kind` with a new identity and places it at `pos`.
    pub fn place_new(&mut self, pos: Position, kind: TokenKind) -> Result<Tile, EngineError> {
        self.index(pos)?;
        let tile = Tile {
            id: TileId(self.next_tile_id),
            kind,
            position: pos,
            special: SpecialState::None,
        };
        self.next_tile_id += 1;
        self.set(pos, Some(tile))?;
        Ok(tile)
    }

    /// Exchanges the contents of two slots. Both coordinates are checked before anything moves.
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), EngineError> {
        self.index(a)?;
        self.index(b)?;
        let tile_a = self.set(a, None)?;
        let tile_b = self.set(b, tile_a)?;
        self.set(a, tile_b)?;
        Ok(())
    }

    /// Every coordinate of the board in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Position::new(row, col)))
    }

    /// Coordinates of all occupied slots in row-major order.
    pub fn all_occupied_positions(&self) -> Vec<Position> {
        self.positions()
            .filter(|&pos| self.cells[pos.row * self.width + pos.col].is_some())
            .collect()
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Snapshot of the kind in every slot, row-major. Two boards with equal snapshots look
    /// identical to the match detector.
    pub fn kinds_snapshot(&self) -> Vec<Option<TokenKind>> {
        self.cells.iter().map(|cell| cell.map(|t| t.kind)).collect()
    }

    /// Renders the board for a terminal with ANSI colors, marking `highlight` cells with `..`
    /// unless they carry a special marker.
    pub fn to_string_with_highlight(&self, highlight: &[Position]) -> String {
        let mut output = String::new();

        output.push_str("  ");
        for c_idx in 0..self.width {
            output.push_str(&format!("{:<2}", c_idx));
        }
        output.push('\n');

        for r_idx in 0..self.height {
            output.push_str(&format!("{:<2}", r_idx));
            for c_idx in 0..self.width {
                let pos = Position::new(r_idx, c_idx);
                match self.cells[r_idx * self.width + c_idx] {
                    Some(tile) => {
                        let plain = tile.special == SpecialState::None;
                        let marker = if highlight.contains(&pos) && plain {
                            '.'
                        } else {
                            tile.special.marker()
                        };
                        output.push_str(&format!(
                            "\x1b[1;{}m{}{}\x1b[m",
                            tile.kind.to_ansi_color_code(),
                            tile.kind.to_char(),
                            marker
                        ));
                    }
                    None => output.push_str("  "),
                }
            }
            if r_idx + 1 < self.height {
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for Board {
    /// Plain-text rendering: a column header, then one line per row with two characters per
    /// cell (kind letter or `.`, followed by the special marker).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c_idx in 0..self.width {
            write!(f, "{:<2}", c_idx)?;
        }
        for r_idx in 0..self.height {
            write!(f, "\n{:<2}", r_idx)?;
            for c_idx in 0..self.width {
                match self.cells[r_idx * self.width + c_idx] {
                    Some(tile) => write!(f, "{}{}", tile.kind.to_char(), tile.special.marker())?,
                    None => write!(f, ". ")?,
                }
            }
        }
        Ok(())
    }
}

/// Draws a kind uniformly from `kinds`.
pub fn random_kind(kinds: &[TokenKind], rng: &mut impl Rng) -> Result<TokenKind, EngineError> {
    kinds
        .choose(rng)
        .copied()
        .ok_or_else(|| EngineError::InvalidConfig("the kind set is empty".to_string()))
}
