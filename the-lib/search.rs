//! Locating query matches in a rope.
//!
//! All public positions are char indices. Internally the regex engine walks
//! the rope in bytes, and results are converted back before they leave this
//! module.
//!
//! Matches never overlap: after a match the scan resumes at its end, and a
//! zero-length match moves the scan forward by one char so that iteration
//! always terminates.
//!
//! ```ignore
//! use ropey::Rope;
//! use the_lib::{query::Query, search::{find_next, count_all}};
//!
//! let text = Rope::from("one two one");
//! let query = Query::new("one").compile()?;
//!
//! assert_eq!(count_all(text.slice(..), &query), 2);
//! assert_eq!(find_next(text.slice(..), &query, 1).map(|m| m.start_char), Some(8));
//! ```

use std::{
  iter::FusedIterator,
  ops::Range,
};

use ropey::RopeSlice;
use the_core::{
  chars::is_word_bounded,
  offset::{
    rope_byte_to_char,
    rope_char_to_byte,
  },
};
use the_stdx::rope::RopeSliceExt;

use crate::{
  cancel::CancelToken,
  error::Result,
  position::{
    Position,
    coords_at_pos,
  },
  query::CompiledQuery,
};

/// Count matches between cancellation checks.
const CANCEL_POLL_INTERVAL: usize = 1024;

/// A located occurrence of a query. Stale as soon as the text is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
  pub start_char: usize,
  pub end_char:   usize,
  /// 0-based line of `start_char`.
  pub line:       usize,
}

impl Match {
  pub fn len(&self) -> usize {
    self.end_char - self.start_char
  }

  pub fn is_empty(&self) -> bool {
    self.start_char == self.end_char
  }

  pub fn char_range(&self) -> Range<usize> {
    self.start_char..self.end_char
  }

  /// The match in UTF-8 bytes, as the highlighting side addresses it.
  pub fn byte_range(&self, text: RopeSlice) -> Range<usize> {
    rope_char_to_byte(text, self.start_char)..rope_char_to_byte(text, self.end_char)
  }

  /// Row and column of the match start.
  pub fn coords(&self, text: RopeSlice) -> Position {
    coords_at_pos(text, self.start_char)
  }

  fn from_bytes(text: RopeSlice, range: Range<usize>) -> Self {
    let start_char = rope_byte_to_char(text, range.start);
    let end_char = rope_byte_to_char(text, range.end);
    Self {
      start_char,
      end_char,
      line: text.char_to_line(start_char),
    }
  }
}

/// First accepted match starting in `start..end` (bytes). Whole-word
/// rejections resume one char after the rejected start.
fn find_bytes(
  text: RopeSlice,
  query: &CompiledQuery,
  mut start: usize,
  end: usize,
) -> Option<Range<usize>> {
  let regex = query.regex()?;
  while start <= end {
    let found = regex.find(text.regex_input_at_bytes(start..end))?;
    let range = found.range();
    if !query.whole_word() || is_whole_word(text, &range) {
      return Some(range);
    }
    start = text.next_char_byte(range.start);
  }
  None
}

fn is_whole_word(text: RopeSlice, range: &Range<usize>) -> bool {
  let start = text.byte_to_char(range.start);
  let end = text.byte_to_char(range.end);
  let before = start.checked_sub(1).map(|idx| text.char(idx));
  let after = text.get_char(end);
  is_word_bounded(before, after)
}

/// Next match starting at or after `from_char`, ignoring `wrap_around`.
pub fn find_forward(text: RopeSlice, query: &CompiledQuery, from_char: usize) -> Option<Match> {
  let from = rope_char_to_byte(text, from_char);
  find_bytes(text, query, from, text.len_bytes()).map(|range| Match::from_bytes(text, range))
}

/// Next match starting at or after `from_char`. With `wrap_around`, a miss
/// retries once from the start of the text.
pub fn find_next(text: RopeSlice, query: &CompiledQuery, from_char: usize) -> Option<Match> {
  let from = rope_char_to_byte(text, from_char);
  let end = text.len_bytes();

  find_bytes(text, query, from, end)
    .or_else(|| {
      (query.wrap_around() && from > 0)
        .then(|| find_bytes(text, query, 0, end))
        .flatten()
    })
    .map(|range| Match::from_bytes(text, range))
}

/// Last match starting before `from_char`, taken from the same
/// non-overlapping sequence [`highlight_all`] produces. With `wrap_around`, a
/// miss falls back to the last match of the whole text.
pub fn find_previous(text: RopeSlice, query: &CompiledQuery, from_char: usize) -> Option<Match> {
  let mut previous = None;
  let mut last = None;
  for mat in highlight_all(text, query) {
    if mat.start_char < from_char {
      previous = Some(mat);
    } else if !query.wrap_around() {
      break;
    }
    last = Some(mat);
  }

  match previous {
    Some(mat) => Some(mat),
    None if query.wrap_around() => last,
    None => None,
  }
}

/// Number of non-overlapping matches.
pub fn count_all(text: RopeSlice, query: &CompiledQuery) -> usize {
  highlight_all(text, query).count()
}

/// [`count_all`] that checks `cancel` every 1024 matches.
pub fn count_all_cancellable(
  text: RopeSlice,
  query: &CompiledQuery,
  cancel: &CancelToken,
) -> Result<usize> {
  let mut count = 0;
  for _ in highlight_all(text, query) {
    count += 1;
    if count % CANCEL_POLL_INTERVAL == 0 {
      cancel.check()?;
    }
  }
  Ok(count)
}

/// All non-overlapping matches in position order. The iterator is lazy and
/// cloning it restarts from the clone's position.
pub fn highlight_all<'a>(text: RopeSlice<'a>, query: &'a CompiledQuery) -> Matches<'a> {
  Matches {
    text,
    query,
    pos: 0,
  }
}

#[derive(Debug, Clone)]
pub struct Matches<'a> {
  text:  RopeSlice<'a>,
  query: &'a CompiledQuery,
  /// Next byte to scan from. Past `len_bytes` once exhausted.
  pos:   usize,
}

impl Iterator for Matches<'_> {
  type Item = Match;

  fn next(&mut self) -> Option<Match> {
    let end = self.text.len_bytes();
    if self.pos > end {
      return None;
    }

    let Some(range) = find_bytes(self.text, self.query, self.pos, end) else {
      self.pos = end + 1;
      return None;
    };
    self.pos = if range.is_empty() {
      self.text.next_char_byte(range.end)
    } else {
      range.end
    };
    Some(Match::from_bytes(self.text, range))
  }
}

impl FusedIterator for Matches<'_> {}
