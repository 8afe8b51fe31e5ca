use std::fmt;

use ropey::RopeSlice;
use the_core::line_ending::line_end_char_index;

/// This is a single point in a text buffer.
/// 0-indexed as all things should be.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub row: usize,
  pub col: usize,
}

impl Position {
  pub fn new(row: usize, col: usize) -> Self {
    Self { row, col }
  }

  pub const fn zero() -> Self {
    Self { row: 0, col: 0 }
  }

  pub const fn is_zero(&self) -> bool {
    self.row == 0 && self.col == 0
  }
}

impl From<(usize, usize)> for Position {
  fn from(value: (usize, usize)) -> Self {
    Position::new(value.0, value.1)
  }
}

/// Displays 1-based, the way line and column numbers are shown to users.
impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.row + 1, self.col + 1)
  }
}

/// Converts a character index into a `Position`.
///
/// Column in `char` count which can be used for row:col display in
/// status line.
pub fn coords_at_pos(text: RopeSlice, pos: usize) -> Position {
  let pos = pos.min(text.len_chars());
  let line = text.char_to_line(pos);
  let line_start = text.line_to_char(line);

  Position::new(line, pos - line_start)
}

/// Convert a `(row, column)` (char counts) to a character index.
///
/// If `row` exceeds the number of lines, the last line is used.
/// If `col` exceeds the length of the line, the line end (before its
/// terminator) is used.
pub fn pos_at_coords(text: RopeSlice, coords: Position) -> usize {
  let line = coords.row.min(text.len_lines().saturating_sub(1));
  let line_start = text.line_to_char(line);
  let line_end = line_end_char_index(&text, line);

  (line_start + coords.col).min(line_end)
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;

  #[test]
  fn test_coords_at_pos() {
    let text = Rope::from("h\u{e9}llo\nw\u{f6}rld");
    let slice = text.slice(..);
    assert_eq!(coords_at_pos(slice, 0), (0, 0).into());
    assert_eq!(coords_at_pos(slice, 5), (0, 5).into());
    assert_eq!(coords_at_pos(slice, 6), (1, 0).into());
    assert_eq!(coords_at_pos(slice, 7), (1, 1).into());
    assert_eq!(coords_at_pos(slice, 100), (1, 5).into());

    let text = Rope::from("a\r\nb");
    assert_eq!(coords_at_pos(text.slice(..), 3), (1, 0).into());
  }

  #[test]
  fn test_pos_at_coords() {
    let text = Rope::from("h\u{e9}llo\nw\u{f6}rld\r\nend");
    let slice = text.slice(..);
    assert_eq!(pos_at_coords(slice, (0, 0).into()), 0);
    assert_eq!(pos_at_coords(slice, (0, 5).into()), 5);
    assert_eq!(pos_at_coords(slice, (0, 9).into()), 5);
    assert_eq!(pos_at_coords(slice, (1, 2).into()), 8);
    assert_eq!(pos_at_coords(slice, (1, 40).into()), 11);
    assert_eq!(pos_at_coords(slice, (9, 1).into()), 14);
  }

  #[test]
  fn round_trip() {
    let text = Rope::from("one\ntwo three\n\nfour");
    let slice = text.slice(..);
    for pos in 0..=slice.len_chars() {
      assert_eq!(pos_at_coords(slice, coords_at_pos(slice, pos)), pos);
    }
  }

  #[test]
  fn displays_one_based() {
    assert_eq!(Position::new(0, 4).to_string(), "1:5");
  }
}
