use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by search, replace and alignment.
///
/// `Io` and `Encoding` are per-file errors: the tree searcher records them as
/// skipped files and keeps going. Everything else aborts the operation.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid pattern '{pattern}': {message}")]
  Pattern { pattern: String, message: String },
  #[error("'{}' is not a directory", .0.display())]
  InvalidDirectory(PathBuf),
  #[error("limit of {limit} exceeded")]
  LimitExceeded { limit: usize },
  #[error("operation cancelled")]
  Cancelled,
  #[error("failed to read '{}': {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to decode '{}': {source}", path.display())]
  Encoding {
    path:   PathBuf,
    #[source]
    source: DecodeError,
  },
  #[error("text cannot be represented in {encoding}")]
  Unencodable { encoding: &'static str },
  #[error("edit {start}..{end} does not fit a text of {len} chars")]
  StaleEdit { start: usize, end: usize, len: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
  #[error("file looks binary")]
  Binary,
  #[error("invalid {encoding} sequence")]
  Malformed { encoding: &'static str },
}

impl Error {
  /// Per-file failures that a tree search records instead of aborting on.
  pub fn is_soft(&self) -> bool {
    matches!(self, Self::Io { .. } | Self::Encoding { .. })
  }
}
