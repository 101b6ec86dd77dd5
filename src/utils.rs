use crate::engine::{Board, Position, TokenKind};

/// Parses an array of string slices into a `Board`.
///
/// Each string slice represents a row, starting from row 0 at the top. The board width is
/// the length of the longest row; shorter rows are padded with empty slots.
///
/// Valid characters are upper-case letters `'A'..='Z'` (kind 0 to 25) and `'.'` for an
/// empty slot. Tiles receive identities in row-major order.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful.
/// * `Err(String)` if the input has no rows, only empty rows, or contains an unrecognized
///   character.
///
/// # Examples
/// ```
/// use match3_engine::utils::board_from_str_array;
/// use match3_engine::engine::{Position, TokenKind};
///
/// let board = board_from_str_array(&["ABC", "B.A"]).unwrap();
/// assert_eq!(board.width(), 3);
/// assert_eq!(board.height(), 2);
/// assert_eq!(board.kind_at(Position::new(0, 1)).unwrap(), Some(TokenKind(1)));
/// assert_eq!(board.kind_at(Position::new(1, 1)).unwrap(), None);
///
/// assert!(board_from_str_array(&["AxB"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, String> {
    let width = s.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    if width == 0 {
        return Err("Board must have at least one row and one column".to_string());
    }

    let mut board = Board::new_empty(width, s.len());
    for (r, row_str) in s.iter().enumerate() {
        for (c, ch) in row_str.chars().enumerate() {
            if ch == '.' {
                continue;
            }
            let kind = TokenKind::from_char(ch).ok_or_else(|| {
                format!("Unrecognized character '{}' in row {} col {}", ch, r, c)
            })?;
            board
                .place_new(Position::new(r, c), kind)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(board)
}

/// Renders the kinds of a board as one string per row, the inverse of
/// [`board_from_str_array`] (identities and special states are not represented).
pub fn board_to_strings(board: &Board) -> Vec<String> {
    (0..board.height())
        .map(|r| {
            (0..board.width())
                .map(|c| match board.kind_at(Position::new(r, c)) {
                    Ok(Some(kind)) => kind.to_char(),
                    _ => '.',
                })
                .collect()
        })
        .collect()
}
