//! Edit descriptions handed back to the caller.
//!
//! Nothing in this crate mutates a document. Replacement produces [`EditOp`]s
//! and the owner of the text applies them, one [`EditGroup`] per undo step.

use std::ops::Range;

use ropey::Rope;

use crate::{
  Tendril,
  error::{
    Error,
    Result,
  },
};

/// Replace the chars in `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
  pub range: Range<usize>,
  pub text:  Tendril,
}

impl EditOp {
  pub fn new(range: Range<usize>, text: impl Into<Tendril>) -> Self {
    Self {
      range,
      text: text.into(),
    }
  }

  /// Chars the text grows (or shrinks) by once this edit is applied.
  pub fn len_delta(&self) -> isize {
    self.text.chars().count() as isize - self.range.len() as isize
  }

  /// Char index right after the inserted text, once applied.
  pub fn end_after(&self) -> usize {
    self.range.start + self.text.chars().count()
  }

  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    let len = text.len_chars();
    let stale = || {
      Error::StaleEdit {
        start: self.range.start,
        end: self.range.end,
        len,
      }
    };
    if self.range.start > self.range.end || self.range.end > len {
      return Err(stale());
    }

    text
      .try_remove(self.range.clone())
      .map_err(|_| stale())?;
    text
      .try_insert(self.range.start, &self.text)
      .map_err(|_| stale())?;
    Ok(())
  }
}

/// Edits applied in order, each against the text left by the previous one.
/// The caller treats the group as a single undo step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditGroup {
  ops: Vec<EditOp>,
}

impl EditGroup {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, op: EditOp) {
    self.ops.push(op);
  }

  pub fn len(&self) -> usize {
    self.ops.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  pub fn ops(&self) -> &[EditOp] {
    &self.ops
  }

  pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
    self.ops.iter()
  }

  /// Applies every edit to a copy of `text`. On failure `text` is left
  /// untouched.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    let mut working = text.clone();
    for op in &self.ops {
      op.apply(&mut working)?;
    }
    *text = working;
    Ok(())
  }
}

impl IntoIterator for EditGroup {
  type Item = EditOp;
  type IntoIter = std::vec::IntoIter<EditOp>;

  fn into_iter(self) -> Self::IntoIter {
    self.ops.into_iter()
  }
}

impl<'a> IntoIterator for &'a EditGroup {
  type Item = &'a EditOp;
  type IntoIter = std::slice::Iter<'a, EditOp>;

  fn into_iter(self) -> Self::IntoIter {
    self.ops.iter()
  }
}

impl FromIterator<EditOp> for EditGroup {
  fn from_iter<T: IntoIterator<Item = EditOp>>(iter: T) -> Self {
    Self {
      ops: iter.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn apply_single() {
    let mut text = Rope::from("hello world");
    EditOp::new(6..11, "there").apply(&mut text).unwrap();
    assert_eq!(text, "hello there");

    let op = EditOp::new(0..5, "hi");
    assert_eq!(op.len_delta(), -3);
    assert_eq!(op.end_after(), 2);
  }

  #[test]
  fn stale_edit_is_rejected() {
    let mut text = Rope::from("short");
    let err = EditOp::new(3..10, "x").apply(&mut text).unwrap_err();
    assert!(matches!(err, Error::StaleEdit { len: 5, .. }));
    assert_eq!(text, "short");
  }

  #[test]
  fn group_applies_in_order_or_not_at_all() {
    let group: EditGroup = [EditOp::new(0..1, "AB"), EditOp::new(1..3, "")]
      .into_iter()
      .collect();
    let mut text = Rope::from("abc");
    group.apply(&mut text).unwrap();
    assert_eq!(text, "Ac");

    let group: EditGroup = [EditOp::new(0..1, "x"), EditOp::new(5..9, "y")]
      .into_iter()
      .collect();
    let mut text = Rope::from("abc");
    assert!(group.apply(&mut text).is_err());
    assert_eq!(text, "abc");
  }
}
