use std::path::Path;

use globset::{
  GlobBuilder,
  GlobSet,
  GlobSetBuilder,
};
use the_lib::error::{
  Error,
  Result,
};

/// Filter used when none is given: any file name with an extension.
pub const DEFAULT_FILTER: &str = "*.*";

/// Semicolon-separated file name globs, e.g. `*.rs;*.toml`.
///
/// A glob without a `/` is matched against the file name only, so `*.txt`
/// finds text files at any depth. A glob containing `/` is matched against
/// the path relative to the search root.
#[derive(Debug, Clone)]
pub struct FileFilter {
  source: String,
  names:  GlobSet,
  paths:  GlobSet,
}

impl FileFilter {
  pub fn parse(filter: &str) -> Result<Self> {
    let filter = filter.trim();
    let filter = if filter.is_empty() {
      DEFAULT_FILTER
    } else {
      filter
    };

    let mut names = GlobSetBuilder::new();
    let mut paths = GlobSetBuilder::new();
    for pattern in filter.split(';').map(str::trim).filter(|p| !p.is_empty()) {
      let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| invalid(pattern, &err))?;
      if pattern.contains('/') {
        paths.add(glob);
      } else {
        names.add(glob);
      }
    }

    Ok(Self {
      source: filter.to_owned(),
      names:  names.build().map_err(|err| invalid(filter, &err))?,
      paths:  paths.build().map_err(|err| invalid(filter, &err))?,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Whether the file at `relative` (relative to the search root) passes.
  pub fn is_match(&self, relative: &Path) -> bool {
    relative
      .file_name()
      .is_some_and(|name| self.names.is_match(name))
      || self.paths.is_match(relative)
  }
}

fn invalid(pattern: &str, err: &globset::Error) -> Error {
  Error::Pattern {
    pattern: pattern.to_owned(),
    message: err.kind().to_string(),
  }
}
