/// Word characters are the ones a whole-word match may not touch on either
/// side.
#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// Whether the text between `before` and `after` sits on word boundaries at
/// both ends. `None` stands for the start or the end of the text.
#[inline]
pub fn is_word_bounded(before: Option<char>, after: Option<char>) -> bool {
  !before.is_some_and(char_is_word) && !after.is_some_and(char_is_word)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn word_bounds() {
    assert!(is_word_bounded(None, None));
    assert!(is_word_bounded(Some(' '), Some('.')));
    assert!(!is_word_bounded(Some('a'), None));
    assert!(!is_word_bounded(None, Some('_')));
    assert!(!is_word_bounded(Some(' '), Some('é')));
  }
}
