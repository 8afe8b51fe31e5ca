//! Immutable document snapshots.
//!
//! Every search, replace and alignment call reads one [`Document`] and never
//! mutates it. Cloning is cheap: the text is a [`Rope`] with shared structure.

use std::{
  borrow::Cow,
  fmt,
  path::{
    Path,
    PathBuf,
  },
};

use encoding_rs::{
  Encoding,
  UTF_8,
  UTF_16BE,
  UTF_16LE,
  WINDOWS_1252,
};
use ropey::{
  Rope,
  RopeSlice,
};
use the_core::line_ending::{
  LineEnding,
  NATIVE_LINE_ENDING,
  auto_detect_line_ending,
  line_without_line_ending,
};

use crate::error::{
  DecodeError,
  Error,
  Result,
};

/// How [`Document::load`] treats bytes that are not valid in the detected
/// encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoding {
  /// Reject binary files and malformed sequences.
  #[default]
  Strict,
  /// Fall back to Windows-1252 for anything that is not valid UTF-8. Never
  /// fails.
  Lossy,
}

#[derive(Clone)]
pub struct Document {
  text:        Rope,
  line_ending: LineEnding,
  encoding:    &'static Encoding,
  /// Whether the source started with a byte order mark.
  bom:         bool,
  path:        Option<PathBuf>,
}

impl Document {
  pub fn new(text: Rope) -> Self {
    let line_ending = auto_detect_line_ending(&text).unwrap_or(NATIVE_LINE_ENDING);
    Self {
      text,
      line_ending,
      encoding: UTF_8,
      bom: false,
      path: None,
    }
  }

  /// Reads and decodes the file at `path`.
  pub fn load(path: impl AsRef<Path>, decoding: Decoding) -> Result<Self> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| {
      Error::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;
    let doc = Self::from_bytes(&bytes, decoding).map_err(|source| {
      Error::Encoding {
        path: path.to_path_buf(),
        source,
      }
    })?;
    Ok(doc.with_path(path))
  }

  /// Decodes raw file contents. A byte order mark selects UTF-8 or UTF-16,
  /// anything else must be UTF-8 unless `decoding` is [`Decoding::Lossy`].
  pub fn from_bytes(bytes: &[u8], decoding: Decoding) -> Result<Self, DecodeError> {
    let (text, encoding, bom) = decode(bytes, decoding)?;
    let mut doc = Self::new(Rope::from_str(&text));
    doc.encoding = encoding;
    doc.bom = bom;
    Ok(doc)
  }

  pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.path = Some(path.into());
    self
  }

  /// Same file and encoding, new contents.
  pub fn with_text(mut self, text: Rope) -> Self {
    self.text = text;
    self
  }

  /// The text encoded back into the encoding it was decoded from, byte
  /// order mark included if the source had one.
  ///
  /// Fails with [`Error::Unencodable`] when a character has no
  /// representation in that encoding.
  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    let text: Cow<str> = self.full_text().into();
    let bom = self.bom.then_some(0xFEFF);
    if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
      let little_endian = self.encoding == UTF_16LE;
      let mut bytes = Vec::with_capacity(2 * (text.len() + 1));
      for unit in bom.into_iter().chain(text.encode_utf16()) {
        if little_endian {
          bytes.extend_from_slice(&unit.to_le_bytes());
        } else {
          bytes.extend_from_slice(&unit.to_be_bytes());
        }
      }
      return Ok(bytes);
    }

    let (encoded, _, had_errors) = self.encoding.encode(&text);
    if had_errors {
      return Err(Error::Unencodable {
        encoding: self.encoding.name(),
      });
    }
    let mut bytes = Vec::with_capacity(encoded.len() + 3);
    if self.bom && self.encoding == UTF_8 {
      bytes.extend_from_slice(b"\xEF\xBB\xBF");
    }
    bytes.extend_from_slice(&encoded);
    Ok(bytes)
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn full_text(&self) -> RopeSlice<'_> {
    self.text.slice(..)
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn line_ending(&self) -> LineEnding {
    self.line_ending
  }

  /// Name of the encoding the document was decoded from.
  pub fn encoding(&self) -> &'static str {
    self.encoding.name()
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  /// Line count as the rope sees it: a trailing terminator opens one more,
  /// empty, line.
  pub fn len_lines(&self) -> usize {
    self.text.len_lines()
  }

  /// Line `idx` without its terminator.
  pub fn line(&self, idx: usize) -> Option<RopeSlice<'_>> {
    (idx < self.text.len_lines()).then(|| line_without_line_ending(&self.full_text(), idx))
  }

  /// Lines without terminators. Unlike [`Document::len_lines`], a trailing
  /// terminator does not produce a final empty line, and an empty document
  /// has no lines at all.
  pub fn lines(&self) -> impl ExactSizeIterator<Item = RopeSlice<'_>> + '_ {
    let text = self.full_text();
    (0..self.line_count()).map(move |idx| line_without_line_ending(&text, idx))
  }

  /// Number of items [`Document::lines`] yields.
  pub fn line_count(&self) -> usize {
    let lines = self.text.len_lines();
    match self.text.get_line(lines - 1) {
      Some(last) if last.len_chars() == 0 => lines - 1,
      _ => lines,
    }
  }
}

impl Default for Document {
  fn default() -> Self {
    Self::new(Rope::new())
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self::new(Rope::from_str(text))
  }
}

impl From<String> for Document {
  fn from(text: String) -> Self {
    Self::new(Rope::from(text))
  }
}

impl From<Rope> for Document {
  fn from(text: Rope) -> Self {
    Self::new(text)
  }
}

impl fmt::Debug for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Document")
      .field("path", &self.path)
      .field("len_chars", &self.text.len_chars())
      .field("line_ending", &self.line_ending)
      .field("encoding", &self.encoding.name())
      .field("bom", &self.bom)
      .finish()
  }
}

/// Text, source encoding and whether a byte order mark was stripped.
type Decoded<'a> = (Cow<'a, str>, &'static Encoding, bool);

fn decode(bytes: &[u8], decoding: Decoding) -> Result<Decoded<'_>, DecodeError> {
  if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors && decoding == Decoding::Strict {
      return Err(DecodeError::Malformed {
        encoding: encoding.name(),
      });
    }
    return Ok((text, encoding, true));
  }

  if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
    && !(decoding == Decoding::Strict && text.contains('\0'))
  {
    return Ok((text, UTF_8, false));
  }

  match decoding {
    Decoding::Strict if bytes.contains(&0) => Err(DecodeError::Binary),
    Decoding::Strict => {
      Err(DecodeError::Malformed {
        encoding: UTF_8.name(),
      })
    },
    Decoding::Lossy => {
      let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
      Ok((text, WINDOWS_1252, false))
    },
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn lines_follow_terminators() {
    let doc = Document::from("one\r\ntwo\nthree\n");
    assert_eq!(doc.len_lines(), 4);
    assert_eq!(doc.line_count(), 3);
    let lines: Vec<String> = doc.lines().map(String::from).collect();
    assert_eq!(lines, ["one", "two", "three"]);
    assert_eq!(doc.line(0).map(String::from).as_deref(), Some("one"));
    assert_eq!(doc.line(3).map(String::from).as_deref(), Some(""));
    assert!(doc.line(4).is_none());
  }

  #[test]
  fn empty_document_has_no_lines() {
    let doc = Document::default();
    assert_eq!(doc.line_count(), 0);
    assert_eq!(doc.lines().count(), 0);
    assert_eq!(doc.len_lines(), 1);

    let doc = Document::from("no terminator");
    assert_eq!(doc.line_count(), 1);
  }

  #[test]
  fn detects_line_ending() {
    assert_eq!(Document::from("a\r\nb").line_ending(), LineEnding::Crlf);
    assert_eq!(Document::from("a\nb").line_ending(), LineEnding::LF);
    assert_eq!(Document::from("ab").line_ending(), NATIVE_LINE_ENDING);
  }

  #[test]
  fn decodes_bom() {
    let doc = Document::from_bytes(b"\xEF\xBB\xBFhello", Decoding::Strict).unwrap();
    assert_eq!(doc.full_text(), "hello");
    assert_eq!(doc.encoding(), "UTF-8");

    let doc = Document::from_bytes(b"\xFF\xFEh\0i\0", Decoding::Strict).unwrap();
    assert_eq!(doc.full_text(), "hi");
    assert_eq!(doc.encoding(), "UTF-16LE");
  }

  #[test]
  fn strict_rejects_binary_and_latin1() {
    assert_eq!(
      Document::from_bytes(b"ab\0cd", Decoding::Strict).unwrap_err(),
      DecodeError::Binary
    );
    assert_eq!(
      Document::from_bytes(b"caf\xE9", Decoding::Strict).unwrap_err(),
      DecodeError::Malformed { encoding: "UTF-8" }
    );
  }

  #[test]
  fn lossy_falls_back_to_windows_1252() {
    let doc = Document::from_bytes(b"caf\xE9", Decoding::Lossy).unwrap();
    assert_eq!(doc.full_text(), "café");
    assert_eq!(doc.encoding(), "windows-1252");
  }

  #[test]
  fn encodes_back_to_source_encoding() {
    let doc = Document::from_bytes(b"caf\xE9", Decoding::Lossy).unwrap();
    let doc = doc.with_text(Rope::from_str("caf\u{e9}s"));
    assert_eq!(doc.encoding(), "windows-1252");
    assert_eq!(doc.to_bytes().unwrap(), b"caf\xE9s");

    let doc = Document::from_bytes(b"\xFF\xFEh\0i\0", Decoding::Strict).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), b"\xFF\xFEh\0i\0");

    assert_eq!(Document::from("plain").to_bytes().unwrap(), b"plain");
  }

  #[test]
  fn utf8_bom_survives_a_round_trip() {
    let doc = Document::from_bytes(b"\xEF\xBB\xBFfoo", Decoding::Strict).unwrap();
    assert_eq!(doc.full_text(), "foo");
    assert_eq!(doc.to_bytes().unwrap(), b"\xEF\xBB\xBFfoo");

    let doc = doc.with_text(Rope::from_str("bar"));
    assert_eq!(doc.to_bytes().unwrap(), b"\xEF\xBB\xBFbar");

    let doc = Document::from_bytes(b"foo", Decoding::Strict).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), b"foo");
  }

  #[test]
  fn unencodable_text_is_an_error() {
    let doc = Document::from_bytes(b"caf\xE9", Decoding::Lossy).unwrap();
    let doc = doc.with_text(Rope::from_str("caf\u{e9} \u{65e5}"));
    assert!(matches!(
      doc.to_bytes(),
      Err(Error::Unencodable {
        encoding: "windows-1252"
      })
    ));
  }

  #[test]
  fn load_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "first\nsecond\n").unwrap();

    let doc = Document::load(file.path(), Decoding::Strict).unwrap();
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.path(), Some(file.path()));

    let missing = file.path().with_extension("missing");
    assert!(matches!(
      Document::load(&missing, Decoding::Strict),
      Err(Error::Io { .. })
    ));
  }
}
