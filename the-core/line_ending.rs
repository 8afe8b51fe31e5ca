use ropey::{
  Rope,
  RopeSlice,
};

#[cfg(target_os = "windows")]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::Crlf;

#[cfg(not(target_os = "windows"))]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::LF;

/// Every terminator ropey splits lines on.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,
  /// U+000A -- LineFeed
  LF,
  /// U+000B -- VerticalTab
  VT,
  /// U+000C -- FormFeed
  FF,
  /// U+000D -- CarriageReturn
  CR,
  /// U+0085 -- NextLine
  Nel,
  /// U+2028 -- Line Separator
  LS,
  /// U+2029 -- ParagraphSeparator
  PS,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Crlf => "\u{000D}\u{000A}",
      Self::LF => "\u{000A}",
      Self::VT => "\u{000B}",
      Self::FF => "\u{000C}",
      Self::CR => "\u{000D}",
      Self::Nel => "\u{0085}",
      Self::LS => "\u{2028}",
      Self::PS => "\u{2029}",
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000B}' => Some(LineEnding::VT),
      '\u{000C}' => Some(LineEnding::FF),
      '\u{000D}' => Some(LineEnding::CR),
      '\u{0085}' => Some(LineEnding::Nel),
      '\u{2028}' => Some(LineEnding::LS),
      '\u{2029}' => Some(LineEnding::PS),
      _ => None,
    }
  }
}

/// Attempts to detect what line ending the passed document uses.
pub fn auto_detect_line_ending(doc: &Rope) -> Option<LineEnding> {
  // Return first matched line ending. VT, FF and PS are special-use only and
  // never decide the style of a document.
  for line in doc.lines().take(100) {
    match get_line_ending(&line) {
      None | Some(LineEnding::VT) | Some(LineEnding::FF) | Some(LineEnding::PS) => {},
      ending => return ending,
    }
  }

  None
}

/// Returns the passed line's line ending, if any.
pub fn get_line_ending(line: &RopeSlice) -> Option<LineEnding> {
  let len = line.len_chars();
  if len == 0 {
    return None;
  }

  // Ropey guarantees that CRLF is always contiguous, so checking the last two
  // chars as one str is enough.
  if len >= 2 && line.char(len - 2) == '\r' && line.char(len - 1) == '\n' {
    return Some(LineEnding::Crlf);
  }

  LineEnding::from_char(line.char(len - 1))
}

/// Returns the passed line's line ending, if any.
pub fn get_line_ending_of_str(line: &str) -> Option<LineEnding> {
  if line.ends_with("\u{000D}\u{000A}") {
    return Some(LineEnding::Crlf);
  }

  line.chars().next_back().and_then(LineEnding::from_char)
}

/// `line` with its trailing terminator removed, if it has one.
pub fn trim_line_ending(line: &str) -> &str {
  match get_line_ending_of_str(line) {
    Some(ending) => &line[..line.len() - ending.as_str().len()],
    None => line,
  }
}

/// Returns the char index of the end of the given line, not including its line
/// ending.
pub fn line_end_char_index(slice: &RopeSlice, line: usize) -> usize {
  slice.line_to_char(line + 1)
    - get_line_ending(&slice.line(line))
      .map(|le| le.len_chars())
      .unwrap_or(0)
}

/// Get line `line_idx` from the passed rope slice, sans any line ending.
pub fn line_without_line_ending<'a>(slice: &RopeSlice<'a>, line_idx: usize) -> RopeSlice<'a> {
  let start = slice.line_to_char(line_idx);
  let end = line_end_char_index(slice, line_idx);
  slice.slice(start..end)
}
