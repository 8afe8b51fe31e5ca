//! Turning matches into edits.
//!
//! [`replace_all`] works on a private copy of the document: every edit is
//! applied to the copy before the next scan, so each [`EditOp`] is expressed
//! against the text as left by the edits before it. Scanning resumes right
//! after the inserted text, which keeps a replacement that contains the
//! pattern from being matched again.

use std::fmt;

use ropey::{
  Rope,
  RopeSlice,
};
use the_stdx::rope::{
  RopeSliceExt,
  regex_cursor::regex_automata::util::interpolate,
};

use crate::{
  cancel::CancelToken,
  document::Document,
  edit::{
    EditGroup,
    EditOp,
  },
  error::Result,
  query::CompiledQuery,
  search::{
    Match,
    find_forward,
    find_next,
  },
};

/// Upper bound on the number of edits one [`replace_all`] may produce.
pub const REPLACE_LIMIT: usize = 100_000;

/// Edits between cancellation checks.
const CANCEL_POLL_INTERVAL: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOptions {
  pub limit: usize,
}

impl Default for ReplaceOptions {
  fn default() -> Self {
    Self {
      limit: REPLACE_LIMIT,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStatus {
  /// Every match was replaced.
  Complete,
  /// Stopped after `limit` edits with matches still left. The edits made so
  /// far are valid and returned.
  LimitExceeded { limit: usize },
}

/// Outcome of [`replace_all`].
#[derive(Debug, Clone)]
pub struct ReplaceAll {
  /// Edits in application order. One undo step.
  pub edits:  EditGroup,
  pub status: ReplaceStatus,
  /// The document text with every edit applied.
  pub text:   Rope,
}

impl ReplaceAll {
  pub fn count(&self) -> usize {
    self.edits.len()
  }

  pub fn is_complete(&self) -> bool {
    self.status == ReplaceStatus::Complete
  }
}

impl fmt::Display for ReplaceAll {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      ReplaceStatus::Complete => write!(f, "Replaced {} occurrence(s)", self.count()),
      ReplaceStatus::LimitExceeded { limit } => {
        write!(
          f,
          "Replaced {} occurrence(s), stopped at the limit of {limit}",
          self.count()
        )
      },
    }
  }
}

/// The replacement text for `mat`. Regex queries expand `$1`, `${name}` and
/// `$$` against the match's capture groups; literal queries insert
/// `replacement` as is.
pub fn expand_replacement(
  text: RopeSlice,
  query: &CompiledQuery,
  mat: &Match,
  replacement: &str,
) -> String {
  let regex = match query.regex() {
    Some(regex) if query.query().is_regex && replacement.contains('$') => regex,
    _ => return replacement.to_owned(),
  };

  let byte_range = mat.byte_range(text);
  let Some(caps) = regex
    .captures_iter(text.regex_input_at_bytes(byte_range.start..))
    .next()
    .filter(|caps| caps.get_match().is_some_and(|m| m.range() == byte_range))
  else {
    return replacement.to_owned();
  };

  let mut dst = String::with_capacity(replacement.len());
  interpolate::string(
    replacement,
    |index, dst| {
      if let Some(span) = caps.get_group(index) {
        for chunk in text.byte_slice(span.range()).chunks() {
          dst.push_str(chunk);
        }
      }
    },
    |name| {
      caps
        .pattern()
        .and_then(|pid| caps.group_info().to_index(pid, name))
    },
    &mut dst,
  );
  dst
}

/// Edit replacing the next match at or after `from_char`. Wrap-around follows
/// the query.
pub fn replace_one(
  doc: &Document,
  query: &CompiledQuery,
  replacement: &str,
  from_char: usize,
) -> Option<EditOp> {
  let text = doc.full_text();
  let mat = find_next(text, query, from_char)?;
  Some(EditOp::new(
    mat.char_range(),
    expand_replacement(text, query, &mat, replacement),
  ))
}

/// Replaces every match, left to right, starting from the beginning of the
/// document.
///
/// Stops with [`ReplaceStatus::LimitExceeded`] once `options.limit` edits
/// have been made and another match is pending; a pattern that matches the
/// empty string right after its own replacement therefore ends there instead
/// of looping. Cancellation is checked every 256 edits and discards all work.
pub fn replace_all(
  doc: &Document,
  query: &CompiledQuery,
  replacement: &str,
  options: &ReplaceOptions,
  cancel: &CancelToken,
) -> Result<ReplaceAll> {
  let mut text = doc.text().clone();
  let mut edits = EditGroup::new();
  let mut pos = 0;

  let status = loop {
    if edits.len() % CANCEL_POLL_INTERVAL == 0 {
      cancel.check()?;
    }

    let slice = text.slice(..);
    let Some(mat) = find_forward(slice, query, pos) else {
      break ReplaceStatus::Complete;
    };
    if edits.len() >= options.limit {
      break ReplaceStatus::LimitExceeded {
        limit: options.limit,
      };
    }

    let op = EditOp::new(
      mat.char_range(),
      expand_replacement(slice, query, &mat, replacement),
    );
    pos = op.end_after();
    op.apply(&mut text)?;
    edits.push(op);
  };

  log::debug!(
    "replaced {} occurrence(s) of {:?} ({status:?})",
    edits.len(),
    query.query().pattern
  );

  Ok(ReplaceAll {
    edits,
    status,
    text,
  })
}

/// Result of [`replace_and_find_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceNext {
  /// The edit for the selected match, if the selection was one.
  pub edit: Option<EditOp>,
  /// The following match, in the coordinates of the text after `edit`.
  pub next: Option<Match>,
}

/// Replaces the selection when it is exactly a match and moves on to the
/// next one. Otherwise only looks for the next match after the selection.
pub fn replace_and_find_next(
  doc: &Document,
  query: &CompiledQuery,
  replacement: &str,
  selection: std::ops::Range<usize>,
) -> Result<ReplaceNext> {
  let text = doc.full_text();
  let selected = find_forward(text, query, selection.start)
    .filter(|mat| mat.char_range() == selection && !mat.is_empty());

  let Some(mat) = selected else {
    return Ok(ReplaceNext {
      edit: None,
      next: find_next(text, query, selection.end),
    });
  };

  let op = EditOp::new(
    mat.char_range(),
    expand_replacement(text, query, &mat, replacement),
  );
  let mut updated = doc.text().clone();
  op.apply(&mut updated)?;
  let next = find_next(updated.slice(..), query, op.end_after());

  Ok(ReplaceNext {
    edit: Some(op),
    next,
  })
}
