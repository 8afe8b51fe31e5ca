//! Two-document comparison and navigation between its differences.

use std::{
  fmt,
  ops::Range,
};

use crate::{
  cancel::CancelToken,
  diff::{
    AlignOptions,
    Opcode,
    Tag,
    align_documents,
  },
  document::Document,
  error::Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
  /// Lines only present on the right.
  Added,
  /// Lines only present on the left.
  Removed,
  /// Lines replaced by different lines.
  Changed,
}

impl DiffKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Added => "added",
      Self::Removed => "removed",
      Self::Changed => "changed",
    }
  }
}

/// A maximal run of non-equal opcodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiffGroup {
  pub kind:        DiffKind,
  /// First left line of the group. For [`DiffKind::Added`] this is the line
  /// the insertion happens before.
  pub left_line:   usize,
  pub right_line:  usize,
  pub left_range:  Range<usize>,
  pub right_range: Range<usize>,
}

impl DiffGroup {
  /// Collapses runs of non-equal opcodes into groups, in order.
  pub fn collapse(opcodes: &[Opcode]) -> Vec<DiffGroup> {
    let mut groups = Vec::new();
    let mut run: Option<(Range<usize>, Range<usize>)> = None;
    for op in opcodes {
      if op.tag == Tag::Equal {
        groups.extend(run.take().map(|(left, right)| Self::from_ranges(left, right)));
        continue;
      }
      run = Some(match run.take() {
        Some((left, right)) => (left.start..op.left_range.end, right.start..op.right_range.end),
        None => (op.left_range.clone(), op.right_range.clone()),
      });
    }
    groups.extend(run.map(|(left, right)| Self::from_ranges(left, right)));
    groups
  }

  fn from_ranges(left_range: Range<usize>, right_range: Range<usize>) -> Self {
    let kind = match (left_range.is_empty(), right_range.is_empty()) {
      (true, _) => DiffKind::Added,
      (false, true) => DiffKind::Removed,
      (false, false) => DiffKind::Changed,
    };
    Self {
      kind,
      left_line: left_range.start,
      right_line: right_range.start,
      left_range,
      right_range,
    }
  }
}

/// Margin marker for one line of either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineMarker {
  Added,
  Removed,
  Changed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}

/// The outcome of comparing two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
  opcodes:    Vec<Opcode>,
  groups:     Vec<DiffGroup>,
  both_empty: bool,
}

impl Comparison {
  pub fn from_opcodes(opcodes: Vec<Opcode>) -> Self {
    let groups = DiffGroup::collapse(&opcodes);
    Self {
      both_empty: opcodes.is_empty(),
      opcodes,
      groups,
    }
  }

  pub fn opcodes(&self) -> &[Opcode] {
    &self.opcodes
  }

  pub fn groups(&self) -> &[DiffGroup] {
    &self.groups
  }

  pub fn is_identical(&self) -> bool {
    self.groups.is_empty()
  }

  /// Marked lines of one side, in line order. Replaced lines are
  /// [`LineMarker::Changed`] on both sides, deleted lines
  /// [`LineMarker::Removed`] on the left and inserted lines
  /// [`LineMarker::Added`] on the right.
  pub fn markers(&self, side: Side) -> Vec<(usize, LineMarker)> {
    let mut markers = Vec::new();
    for op in &self.opcodes {
      let (range, marker) = match (op.tag, side) {
        (Tag::Equal, _) => continue,
        (Tag::Replace, Side::Left) => (op.left_range.clone(), LineMarker::Changed),
        (Tag::Replace, Side::Right) => (op.right_range.clone(), LineMarker::Changed),
        (Tag::Delete, Side::Left) => (op.left_range.clone(), LineMarker::Removed),
        (Tag::Insert, Side::Right) => (op.right_range.clone(), LineMarker::Added),
        (Tag::Delete, Side::Right) | (Tag::Insert, Side::Left) => continue,
      };
      markers.extend(range.map(|line| (line, marker)));
    }
    markers
  }
}

impl fmt::Display for Comparison {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.both_empty {
      f.write_str("No files loaded")
    } else if self.groups.is_empty() {
      f.write_str("Files are identical")
    } else {
      write!(f, "{} difference(s) found", self.groups.len())
    }
  }
}

/// Aligns two documents and groups their differences.
pub fn compare(
  left: &Document,
  right: &Document,
  options: &AlignOptions,
  cancel: &CancelToken,
) -> Result<Comparison> {
  align_documents(left, right, options, cancel).map(Comparison::from_opcodes)
}

/// Cyclic cursor over the groups of a comparison. Nothing is selected until
/// the first call to [`DiffNavigator::next`] or [`DiffNavigator::previous`].
#[derive(Debug, Clone, Default)]
pub struct DiffNavigator {
  groups:  Vec<DiffGroup>,
  current: Option<usize>,
}

impl DiffNavigator {
  pub fn new(groups: Vec<DiffGroup>) -> Self {
    Self {
      groups,
      current: None,
    }
  }

  /// Runs a new comparison and starts over with its groups.
  pub fn compare(
    &mut self,
    left: &Document,
    right: &Document,
    options: &AlignOptions,
    cancel: &CancelToken,
  ) -> Result<Comparison> {
    let comparison = compare(left, right, options, cancel)?;
    self.reset(comparison.groups().to_vec());
    Ok(comparison)
  }

  /// Replaces the groups and clears the selection.
  pub fn reset(&mut self, groups: Vec<DiffGroup>) {
    self.groups = groups;
    self.current = None;
  }

  // Not an iterator: the cursor cycles forever.
  #[allow(clippy::should_implement_trait)]
  pub fn next(&mut self) -> Option<&DiffGroup> {
    if self.groups.is_empty() {
      return None;
    }
    let idx = match self.current {
      Some(idx) => (idx + 1) % self.groups.len(),
      None => 0,
    };
    self.current = Some(idx);
    self.groups.get(idx)
  }

  /// Steps back, wrapping to the last group. With nothing selected yet this
  /// selects the last group.
  pub fn previous(&mut self) -> Option<&DiffGroup> {
    if self.groups.is_empty() {
      return None;
    }
    let len = self.groups.len();
    let idx = match self.current {
      Some(idx) => (idx + len - 1) % len,
      None => len - 1,
    };
    self.current = Some(idx);
    self.groups.get(idx)
  }

  pub fn current(&self) -> Option<&DiffGroup> {
    self.current.and_then(|idx| self.groups.get(idx))
  }

  pub fn current_index(&self) -> Option<usize> {
    self.current
  }

  pub fn groups(&self) -> &[DiffGroup] {
    &self.groups
  }

  pub fn len(&self) -> usize {
    self.groups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }

  /// `Diff i of N` for the selected group, 1-based.
  pub fn status(&self) -> Option<String> {
    self
      .current
      .map(|idx| format!("Diff {} of {}", idx + 1, self.groups.len()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diff::align;

  fn compare_str(left: &str, right: &str) -> Comparison {
    compare(
      &Document::from(left),
      &Document::from(right),
      &AlignOptions::default(),
      &CancelToken::new(),
    )
    .unwrap()
  }

  #[test]
  fn identical_has_no_groups() {
    let lines = ["a", "b", "c"];
    assert!(DiffGroup::collapse(&align(&lines, &lines)).is_empty());

    let comparison = compare_str("a\nb\n", "a\nb\n");
    assert!(comparison.is_identical());
    assert_eq!(comparison.to_string(), "Files are identical");
    assert_eq!(compare_str("", "").to_string(), "No files loaded");
  }

  #[test]
  fn kinds_follow_opcodes() {
    let comparison = compare_str("a\nb\nc\nd\n", "a\nx\nc\nd\ne\n");
    assert_eq!(comparison.groups(), [
      DiffGroup {
        kind:        DiffKind::Changed,
        left_line:   1,
        right_line:  1,
        left_range:  1..2,
        right_range: 1..2,
      },
      DiffGroup {
        kind:        DiffKind::Added,
        left_line:   4,
        right_line:  4,
        left_range:  4..4,
        right_range: 4..5,
      },
    ]);
    assert_eq!(comparison.to_string(), "2 difference(s) found");

    let comparison = compare_str("a\nb\nc\n", "a\nc\n");
    assert_eq!(comparison.groups()[0].kind, DiffKind::Removed);
    assert_eq!(comparison.groups()[0].left_line, 1);
  }

  #[test]
  fn adjacent_opcodes_collapse() {
    let opcodes = [
      Opcode::new(Tag::Equal, 0..1, 0..1),
      Opcode::new(Tag::Delete, 1..2, 1..1),
      Opcode::new(Tag::Insert, 2..2, 1..3),
      Opcode::new(Tag::Equal, 2..3, 3..4),
    ];
    let groups = DiffGroup::collapse(&opcodes);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, DiffKind::Changed);
    assert_eq!(groups[0].left_range, 1..2);
    assert_eq!(groups[0].right_range, 1..3);
  }

  #[test]
  fn markers_per_side() {
    let comparison = compare_str("a\nb\nc\n", "a\nB\nc\nd\n");
    assert_eq!(comparison.markers(Side::Left), [(1, LineMarker::Changed)]);
    assert_eq!(comparison.markers(Side::Right), [
      (1, LineMarker::Changed),
      (3, LineMarker::Added)
    ]);

    let comparison = compare_str("a\nb\n", "b\n");
    assert_eq!(comparison.markers(Side::Left), [(0, LineMarker::Removed)]);
    assert!(comparison.markers(Side::Right).is_empty());
  }

  #[test]
  fn navigation_cycles() {
    let comparison = compare_str("a\nb\nc\nd\ne\n", "a\nB\nc\nD\ne\nf\n");
    let mut nav = DiffNavigator::new(comparison.groups().to_vec());
    assert_eq!(nav.len(), 3);
    assert_eq!(nav.current_index(), None);
    assert_eq!(nav.status(), None);

    assert_eq!(nav.next().map(|g| g.left_line), Some(1));
    assert_eq!(nav.next().map(|g| g.left_line), Some(3));
    assert_eq!(nav.next().map(|g| g.left_line), Some(5));
    assert_eq!(nav.next().map(|g| g.left_line), Some(1));
    assert_eq!(nav.status().as_deref(), Some("Diff 1 of 3"));
    assert_eq!(nav.previous().map(|g| g.left_line), Some(5));
    assert_eq!(nav.current_index(), Some(2));
  }

  #[test]
  fn previous_without_selection_picks_last() {
    let comparison = compare_str("a\nb\nc\n", "x\nb\ny\n");
    let mut nav = DiffNavigator::new(comparison.groups().to_vec());
    assert_eq!(nav.previous().map(|g| g.left_line), Some(2));
  }

  #[test]
  fn recompare_resets() {
    let mut nav = DiffNavigator::default();
    assert_eq!(nav.next(), None);

    let options = AlignOptions::default();
    let cancel = CancelToken::new();
    nav
      .compare(&Document::from("a\n"), &Document::from("b\n"), &options, &cancel)
      .unwrap();
    nav.next();
    assert_eq!(nav.current_index(), Some(0));

    nav
      .compare(&Document::from("a\n"), &Document::from("c\n"), &options, &cancel)
      .unwrap();
    assert_eq!(nav.current_index(), None);
    assert!(nav.current().is_none());
  }
}
