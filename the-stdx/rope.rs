//! Regex search over rope slices.
//!
//! Wraps `regex-cursor` so that the regex engine walks the rope chunks in
//! place instead of requiring a contiguous copy of the text.

use std::ops::{
  Bound,
  RangeBounds,
};

pub use regex_cursor;
pub use regex_cursor::{
  Input as RegexInput,
  RopeyCursor,
  engines::meta::{
    Builder as RegexBuilder,
    Regex,
  },
  regex_automata::util::syntax::Config,
};
use ropey::RopeSlice;

pub trait RopeSliceExt<'a>: Sized {
  /// Regex input restricted to a byte range. Look-around assertions such as
  /// `\b` and `^` still see the text outside of the range.
  fn regex_input_at_bytes<R: RangeBounds<usize>>(
    self,
    byte_range: R,
  ) -> RegexInput<RopeyCursor<'a>>;
  /// Byte index of the char boundary right after `byte_idx`, or
  /// `len_bytes() + 1` once the end has been reached.
  fn next_char_byte(self, byte_idx: usize) -> usize;
}

impl<'a> RopeSliceExt<'a> for RopeSlice<'a> {
  fn regex_input_at_bytes<R: RangeBounds<usize>>(
    self,
    byte_range: R,
  ) -> RegexInput<RopeyCursor<'a>> {
    let input = match byte_range.start_bound() {
      Bound::Included(&pos) | Bound::Excluded(&pos) => {
        RegexInput::new(RopeyCursor::at(self, pos))
      },
      Bound::Unbounded => RegexInput::new(self),
    };
    input.range(byte_range)
  }

  fn next_char_byte(self, byte_idx: usize) -> usize {
    if byte_idx >= self.len_bytes() {
      return self.len_bytes() + 1;
    }
    let char_idx = self.byte_to_char(byte_idx);
    self.char_to_byte(char_idx + 1)
  }
}
