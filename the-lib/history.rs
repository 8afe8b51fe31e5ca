use std::{
  collections::VecDeque,
  num::NonZeroUsize,
};

/// Entries kept by default.
pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Recently used search or replacement strings, most recent first, without
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHistory {
  entries:  VecDeque<String>,
  capacity: NonZeroUsize,
}

impl Default for SearchHistory {
  fn default() -> Self {
    Self::with_capacity(NonZeroUsize::new(DEFAULT_HISTORY_SIZE).unwrap_or(NonZeroUsize::MIN))
  }
}

impl SearchHistory {
  pub fn with_capacity(capacity: NonZeroUsize) -> Self {
    Self {
      entries: VecDeque::with_capacity(capacity.get()),
      capacity,
    }
  }

  /// Moves `entry` to the front, dropping the oldest entry when full. Empty
  /// strings are ignored.
  pub fn push(&mut self, entry: impl Into<String>) {
    let entry = entry.into();
    if entry.is_empty() {
      return;
    }

    if let Some(idx) = self.entries.iter().position(|existing| *existing == entry) {
      self.entries.remove(idx);
    }
    self.entries.push_front(entry);
    self.entries.truncate(self.capacity.get());
  }

  pub fn latest(&self) -> Option<&str> {
    self.entries.front().map(String::as_str)
  }

  pub fn get(&self, idx: usize) -> Option<&str> {
    self.entries.get(idx).map(String::as_str)
  }

  pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
    self.entries.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn most_recent_first_without_duplicates() {
    let mut history = SearchHistory::default();
    history.push("foo");
    history.push("bar");
    history.push("foo");
    history.push("");

    assert_eq!(history.iter().collect::<Vec<_>>(), ["foo", "bar"]);
    assert_eq!(history.latest(), Some("foo"));
  }

  #[test]
  fn bounded() {
    let mut history = SearchHistory::with_capacity(NonZeroUsize::new(2).unwrap());
    history.push("a");
    history.push("b");
    history.push("c");

    assert_eq!(history.len(), 2);
    assert_eq!(history.get(0), Some("c"));
    assert_eq!(history.get(1), Some("b"));
    assert_eq!(history.get(2), None);
  }
}
