//! Line alignment of two texts.
//!
//! The aligner repeatedly picks the longest block of identical lines, then
//! recurses into the unmatched regions on either side (Ratcliff/Obershelp).
//! Among equally long blocks the one starting earliest on the left wins, then
//! the one starting earliest on the right, so the output is deterministic and
//! matches what `difflib.SequenceMatcher` produces for the same input.
//!
//! Lines are interned before matching, and line terminators are stripped
//! first so that CRLF and LF versions of a line compare equal.

use std::{
  borrow::Cow,
  collections::HashMap,
  ops::Range,
  time::Instant,
};

use imara_diff::{
  InternedInput,
  Token,
  TokenSource,
};
use the_core::line_ending::trim_line_ending;

use crate::{
  cancel::CancelToken,
  document::Document,
  error::{
    Error,
    Result,
  },
};

/// Default ceiling on the number of lines per side.
pub const DEFAULT_MAX_LINES: usize = 50_000;

/// Right-hand sides with at least this many lines are subject to the popular
/// line heuristic.
const AUTOJUNK_MIN_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignOptions {
  /// Lines of the right side that occur in more than 1% of it (plus one) are
  /// not used to anchor a matching block. They still extend one.
  pub autojunk:  bool,
  /// Inputs with more lines than this on either side fail with
  /// [`Error::LimitExceeded`].
  pub max_lines: usize,
}

impl Default for AlignOptions {
  fn default() -> Self {
    Self {
      autojunk:  true,
      max_lines: DEFAULT_MAX_LINES,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
  Equal,
  Insert,
  Delete,
  Replace,
}

impl Tag {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Equal => "equal",
      Self::Insert => "insert",
      Self::Delete => "delete",
      Self::Replace => "replace",
    }
  }
}

/// One aligned segment. The opcodes of an alignment partition both line
/// ranges in order, without gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Opcode {
  pub tag:         Tag,
  pub left_range:  Range<usize>,
  pub right_range: Range<usize>,
}

impl Opcode {
  pub fn new(tag: Tag, left_range: Range<usize>, right_range: Range<usize>) -> Self {
    Self {
      tag,
      left_range,
      right_range,
    }
  }
}

struct NormalizedLines<'a, S>(&'a [S]);

impl<'a, S: AsRef<str>> TokenSource for NormalizedLines<'a, S> {
  type Token = &'a str;
  type Tokenizer = std::iter::Map<std::slice::Iter<'a, S>, fn(&'a S) -> &'a str>;

  fn tokenize(&self) -> Self::Tokenizer {
    self.0.iter().map(normalize_line::<S> as fn(&'a S) -> &'a str)
  }

  fn estimate_tokens(&self) -> u32 {
    u32::try_from(self.0.len()).unwrap_or(u32::MAX)
  }
}

fn normalize_line<S: AsRef<str>>(line: &S) -> &str {
  trim_line_ending(line.as_ref())
}

/// Aligns `left` against `right` with default heuristics and no size limit.
pub fn align<S: AsRef<str>>(left: &[S], right: &[S]) -> Vec<Opcode> {
  let options = AlignOptions {
    max_lines: usize::MAX,
    ..AlignOptions::default()
  };
  // Without a size limit or a cancellation request this cannot fail.
  align_with(left, right, &options, &CancelToken::new()).unwrap_or_default()
}

/// Aligns `left` against `right`, refusing inputs beyond
/// `options.max_lines` and checking `cancel` once per scanned row.
pub fn align_with<S: AsRef<str>>(
  left: &[S],
  right: &[S],
  options: &AlignOptions,
  cancel: &CancelToken,
) -> Result<Vec<Opcode>> {
  if left.len() > options.max_lines || right.len() > options.max_lines {
    return Err(Error::LimitExceeded {
      limit: options.max_lines,
    });
  }

  let start = Instant::now();
  let input = InternedInput::new(NormalizedLines(left), NormalizedLines(right));
  let matcher = Matcher::new(&input.before, &input.after, options.autojunk);
  let blocks = matcher.matching_blocks(cancel)?;
  let opcodes = opcodes(&blocks);
  log::debug!(
    "aligned {} against {} lines into {} opcodes in {:?}",
    left.len(),
    right.len(),
    opcodes.len(),
    start.elapsed()
  );
  Ok(opcodes)
}

/// Aligns the lines of two documents.
pub fn align_documents(
  left: &Document,
  right: &Document,
  options: &AlignOptions,
  cancel: &CancelToken,
) -> Result<Vec<Opcode>> {
  let left: Vec<Cow<str>> = left.lines().map(Cow::from).collect();
  let right: Vec<Cow<str>> = right.lines().map(Cow::from).collect();
  align_with(&left, &right, options, cancel)
}

/// `size` identical lines at `left` and `right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
  left:  usize,
  right: usize,
  size:  usize,
}

struct Matcher<'a> {
  left:         &'a [Token],
  right:        &'a [Token],
  /// Positions of every anchoring line in `right`.
  right_lookup: HashMap<Token, Vec<usize>>,
}

impl<'a> Matcher<'a> {
  fn new(left: &'a [Token], right: &'a [Token], autojunk: bool) -> Self {
    let mut right_lookup: HashMap<Token, Vec<usize>> = HashMap::new();
    for (idx, &token) in right.iter().enumerate() {
      right_lookup.entry(token).or_default().push(idx);
    }

    if autojunk && right.len() >= AUTOJUNK_MIN_LINES {
      let threshold = right.len() / 100 + 1;
      right_lookup.retain(|_, positions| positions.len() <= threshold);
    }

    Self {
      left,
      right,
      right_lookup,
    }
  }

  /// Longest block within `left[lo..hi]` x `right[lo..hi]`.
  fn longest_match(
    &self,
    left: Range<usize>,
    right: Range<usize>,
    cancel: &CancelToken,
  ) -> Result<Block> {
    let mut best = Block {
      left:  left.start,
      right: right.start,
      size:  0,
    };

    // Length of the block ending at (row - 1, j), keyed by j.
    let mut prev_row: HashMap<usize, usize> = HashMap::new();
    let mut row: HashMap<usize, usize> = HashMap::new();
    for i in left.clone() {
      cancel.check()?;
      row.clear();
      if let Some(positions) = self.right_lookup.get(&self.left[i]) {
        for &j in positions {
          if j < right.start {
            continue;
          }
          if j >= right.end {
            break;
          }
          let len = j
            .checked_sub(1)
            .and_then(|prev| prev_row.get(&prev))
            .copied()
            .unwrap_or(0)
            + 1;
          row.insert(j, len);
          if len > best.size {
            best = Block {
              left:  i + 1 - len,
              right: j + 1 - len,
              size:  len,
            };
          }
        }
      }
      std::mem::swap(&mut prev_row, &mut row);
    }

    // Non-anchoring lines may still extend the block on either side.
    while best.left > left.start
      && best.right > right.start
      && self.left[best.left - 1] == self.right[best.right - 1]
    {
      best.left -= 1;
      best.right -= 1;
      best.size += 1;
    }
    while best.left + best.size < left.end
      && best.right + best.size < right.end
      && self.left[best.left + best.size] == self.right[best.right + best.size]
    {
      best.size += 1;
    }

    Ok(best)
  }

  /// Matching blocks in order, adjacent blocks merged, terminated by a
  /// zero-sized block at the end of both sides.
  fn matching_blocks(&self, cancel: &CancelToken) -> Result<Vec<Block>> {
    let mut pending = vec![(0..self.left.len(), 0..self.right.len())];
    let mut blocks = Vec::new();
    while let Some((left, right)) = pending.pop() {
      let block = self.longest_match(left.clone(), right.clone(), cancel)?;
      if block.size == 0 {
        continue;
      }
      blocks.push(block);
      if left.start < block.left && right.start < block.right {
        pending.push((left.start..block.left, right.start..block.right));
      }
      if block.left + block.size < left.end && block.right + block.size < right.end {
        pending.push((
          block.left + block.size..left.end,
          block.right + block.size..right.end,
        ));
      }
    }
    blocks.sort_unstable();

    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len() + 1);
    for block in blocks {
      match merged.last_mut() {
        Some(last) if last.left + last.size == block.left && last.right + last.size == block.right => {
          last.size += block.size;
        },
        _ => merged.push(block),
      }
    }
    merged.push(Block {
      left:  self.left.len(),
      right: self.right.len(),
      size:  0,
    });
    Ok(merged)
  }
}

fn opcodes(blocks: &[Block]) -> Vec<Opcode> {
  let mut opcodes = Vec::with_capacity(blocks.len() * 2);
  let (mut i, mut j) = (0, 0);
  for block in blocks {
    let tag = match (i < block.left, j < block.right) {
      (true, true) => Some(Tag::Replace),
      (true, false) => Some(Tag::Delete),
      (false, true) => Some(Tag::Insert),
      (false, false) => None,
    };
    if let Some(tag) = tag {
      opcodes.push(Opcode::new(tag, i..block.left, j..block.right));
    }
    i = block.left + block.size;
    j = block.right + block.size;
    if block.size > 0 {
      opcodes.push(Opcode::new(Tag::Equal, block.left..i, block.right..j));
    }
  }
  opcodes
}
