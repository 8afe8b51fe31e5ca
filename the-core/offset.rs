//! Translation between char offsets and UTF-8 byte offsets.
//!
//! Matching and alignment work in char space, while the embedded editing
//! engine addresses its text in encoded bytes: every range handed over for
//! highlighting or cursor placement goes through here first.
//!
//! All functions accept offsets in `[0, len]`. Offsets past the end clamp to
//! the end, and a byte offset that lands inside a multi-byte sequence rounds
//! down to the start of that char instead of panicking.

use std::ops::Range;

use ropey::RopeSlice;

/// Byte offset of the char at `char_idx` in `text`.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
  text
    .char_indices()
    .nth(char_idx)
    .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

/// Char offset of the char containing `byte_idx` in `text`.
pub fn byte_to_char(text: &str, byte_idx: usize) -> usize {
  let byte_idx = floor_char_boundary(text, byte_idx);
  text[..byte_idx].chars().count()
}

/// The closest char boundary at or before `byte_idx`.
pub fn floor_char_boundary(text: &str, byte_idx: usize) -> usize {
  if byte_idx >= text.len() {
    return text.len();
  }

  let mut idx = byte_idx;
  while !text.is_char_boundary(idx) {
    idx -= 1;
  }
  idx
}

/// Rope flavour of [`char_to_byte`].
pub fn rope_char_to_byte(text: RopeSlice, char_idx: usize) -> usize {
  text.char_to_byte(char_idx.min(text.len_chars()))
}

/// Rope flavour of [`byte_to_char`]. Ropey already maps a byte inside a
/// multi-byte sequence to the char that contains it.
pub fn rope_byte_to_char(text: RopeSlice, byte_idx: usize) -> usize {
  text.byte_to_char(byte_idx.min(text.len_bytes()))
}

/// `(byte_start, byte_len)` of a char range, the shape highlight markers are
/// addressed with.
pub fn char_range_to_bytes(text: RopeSlice, range: Range<usize>) -> (usize, usize) {
  let start = rope_char_to_byte(text, range.start);
  let end = rope_char_to_byte(text, range.end.max(range.start));
  (start, end - start)
}
