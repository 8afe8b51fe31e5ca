//! Searching every matching file under a directory.
//!
//! Files are collected first and visited in sorted path order, so the hit
//! order is the same on every run. Each line is tested on its own with the
//! same matching rules as the single-buffer scanner; wrap-around has no
//! meaning here.
//!
//! Files that cannot be read or decoded do not stop the scan. They are
//! recorded in [`SearchSummary::skipped`] and the scan moves on.

mod filter;
mod worker;

use std::{
  borrow::Cow,
  fmt,
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
  time::Instant,
};

pub use filter::{
  DEFAULT_FILTER,
  FileFilter,
};
use ignore::{
  DirEntry,
  WalkBuilder,
};
use the_lib::{
  cancel::CancelToken,
  document::{
    Decoding,
    Document,
  },
  error::{
    Error,
    Result,
  },
  query::{
    CompiledQuery,
    Query,
  },
};
use the_stdx::path::{
  canonicalize,
  display_relative,
};
pub use worker::SearchHandle;

pub const DEFAULT_MAX_HITS: usize = 10_000;
pub const DEFAULT_MAX_FILES: usize = 10_000;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Chars of a matching line kept in [`SearchHit::line_text`].
pub const MAX_LINE_TEXT: usize = 200;

/// Lines scanned between cancellation checks.
const CANCEL_POLL_LINES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSearchOptions {
  pub max_hits:      usize,
  pub max_files:     usize,
  /// Larger files are skipped without being read.
  pub max_file_size: u64,
  /// Also visit hidden files and directories.
  pub hidden:        bool,
  pub decoding:      Decoding,
}

impl Default for TreeSearchOptions {
  fn default() -> Self {
    Self {
      max_hits:      DEFAULT_MAX_HITS,
      max_files:     DEFAULT_MAX_FILES,
      max_file_size: DEFAULT_MAX_FILE_SIZE,
      hidden:        false,
      decoding:      Decoding::Strict,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
  pub path:         PathBuf,
  /// `path` relative to the search root, `/`-separated.
  pub display_path: String,
  /// 1-based.
  pub line_number:  usize,
  /// The matching line, trimmed and cut to [`MAX_LINE_TEXT`] chars.
  pub line_text:    String,
}

#[derive(Debug)]
pub enum SkipReason {
  TooLarge { len: u64, limit: u64 },
  Failed(Error),
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::TooLarge { len, limit } => write!(f, "{len} bytes exceeds the limit of {limit}"),
      Self::Failed(err) => write!(f, "{err}"),
    }
  }
}

/// A file that was not searched.
#[derive(Debug)]
pub struct SkippedFile {
  pub path:   PathBuf,
  pub reason: SkipReason,
}

/// Why a scan ended before visiting everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
  HitLimit,
  FileLimit,
  Cancelled,
}

#[derive(Debug, Default)]
pub struct SearchSummary {
  pub files_scanned:   usize,
  pub files_with_hits: usize,
  pub hits:            usize,
  pub skipped:         Vec<SkippedFile>,
  pub truncated:       Option<Truncation>,
}

impl SearchSummary {
  pub fn is_truncated(&self) -> bool {
    self.truncated.is_some()
  }
}

impl fmt::Display for SearchSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Found {} match(es) in {} file(s)",
      self.hits, self.files_with_hits
    )?;
    if !self.skipped.is_empty() {
      write!(f, ", {} skipped", self.skipped.len())?;
    }
    match self.truncated {
      Some(Truncation::HitLimit) => f.write_str(" (stopped at the match limit)"),
      Some(Truncation::FileLimit) => f.write_str(" (stopped at the file limit)"),
      Some(Truncation::Cancelled) => f.write_str(" (cancelled)"),
      None => Ok(()),
    }
  }
}

/// Everything a finished scan produced.
#[derive(Debug)]
pub struct SearchReport {
  pub hits:    Vec<SearchHit>,
  pub summary: SearchSummary,
}

/// A validated search over a directory tree.
#[derive(Debug, Clone)]
pub struct TreeSearch {
  root:    PathBuf,
  filter:  FileFilter,
  query:   Arc<CompiledQuery>,
  options: TreeSearchOptions,
}

impl TreeSearch {
  /// Checks the root, the filter and the query before any file is touched.
  pub fn new(
    root: impl AsRef<Path>,
    filter: &str,
    query: &Query,
    options: TreeSearchOptions,
  ) -> Result<Self> {
    let root = canonicalize(root);
    if !root.is_dir() {
      return Err(Error::InvalidDirectory(root));
    }
    let filter = FileFilter::parse(filter)?;
    let query = Arc::new(query.compile()?);

    Ok(Self {
      root,
      filter,
      query,
      options,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn options(&self) -> &TreeSearchOptions {
    &self.options
  }

  /// Files passing the filter, in sorted order. `None` when cancelled
  /// during the walk.
  fn files(&self, cancel: &CancelToken) -> Option<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(&self.root)
      .hidden(!self.options.hidden)
      .parents(false)
      .ignore(false)
      .git_ignore(false)
      .git_global(false)
      .git_exclude(false)
      .follow_links(false)
      .filter_entry(is_searchable)
      .build();

    for entry in walker {
      if cancel.is_cancelled() {
        return None;
      }

      let entry = match entry {
        Ok(entry) => entry,
        Err(err) => {
          log::warn!("tree search walker error: {err}");
          continue;
        },
      };
      if !entry.file_type().is_some_and(|ft| ft.is_file()) {
        continue;
      }

      let path = entry.into_path();
      let relative = path.strip_prefix(&self.root).unwrap_or(&path);
      if self.filter.is_match(relative) {
        files.push(path);
      }
    }

    // Plain string order, so `a.txt` comes before `a/z.txt`.
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Some(files)
  }

  /// Lazily yields hits. The walk happens on the first call to `next`.
  pub fn hits(&self, cancel: CancelToken) -> Hits {
    Hits {
      search: self.clone(),
      cancel,
      files: None,
      current: None,
      summary: SearchSummary::default(),
      started: Instant::now(),
      done: false,
    }
  }

  /// Runs the scan on a background thread.
  pub fn spawn(&self, cancel: CancelToken) -> SearchHandle {
    worker::spawn(self.hits(cancel))
  }
}

fn is_searchable(entry: &DirEntry) -> bool {
  !matches!(
    entry.file_name().to_str(),
    Some(".git" | ".pijul" | ".jj" | ".hg" | ".svn")
  )
}

/// Walks, filters and scans in one call.
pub fn search(
  root: impl AsRef<Path>,
  filter: &str,
  query: &Query,
  options: TreeSearchOptions,
  cancel: &CancelToken,
) -> Result<SearchReport> {
  let mut hits = TreeSearch::new(root, filter, query, options)?.hits(cancel.clone());
  let collected = hits.by_ref().collect();
  Ok(SearchReport {
    hits:    collected,
    summary: hits.into_summary(),
  })
}

struct FileScan {
  path:    PathBuf,
  display: String,
  doc:     Document,
  line:    usize,
  has_hit: bool,
}

/// Iterator over the hits of a [`TreeSearch`].
pub struct Hits {
  search:  TreeSearch,
  cancel:  CancelToken,
  files:   Option<std::vec::IntoIter<PathBuf>>,
  current: Option<FileScan>,
  summary: SearchSummary,
  started: Instant,
  done:    bool,
}

impl Hits {
  /// Counters so far. Complete once the iterator returned `None`.
  pub fn summary(&self) -> &SearchSummary {
    &self.summary
  }

  pub fn into_summary(self) -> SearchSummary {
    self.summary
  }

  fn finish(&mut self, truncated: Option<Truncation>) {
    if self.done {
      return;
    }
    self.done = true;
    self.current = None;
    self.summary.truncated = truncated;
    log::debug!(
      "tree search in {} finished in {:?}: {}",
      self.search.root.display(),
      self.started.elapsed(),
      self.summary
    );
  }

  fn open(&self, path: &Path) -> std::result::Result<Document, SkipReason> {
    let limit = self.search.options.max_file_size;
    let len = std::fs::metadata(path)
      .map_err(|source| {
        SkipReason::Failed(Error::Io {
          path: path.to_path_buf(),
          source,
        })
      })?
      .len();
    if len > limit {
      return Err(SkipReason::TooLarge { len, limit });
    }
    Document::load(path, self.search.options.decoding).map_err(SkipReason::Failed)
  }

  /// Next matching line of the current file, if any.
  fn scan_current(&mut self) -> Option<Result<SearchHit, Truncation>> {
    let scan = self.current.as_mut()?;
    while scan.line < scan.doc.line_count() {
      if scan.line % CANCEL_POLL_LINES == 0 && self.cancel.is_cancelled() {
        return Some(Err(Truncation::Cancelled));
      }

      let idx = scan.line;
      scan.line += 1;
      let Some(line) = scan.doc.line(idx) else {
        break;
      };
      if !self.search.query.is_match(line) {
        continue;
      }
      if self.summary.hits >= self.search.options.max_hits {
        return Some(Err(Truncation::HitLimit));
      }

      self.summary.hits += 1;
      if !scan.has_hit {
        scan.has_hit = true;
        self.summary.files_with_hits += 1;
      }
      let text: Cow<str> = line.into();
      return Some(Ok(SearchHit {
        path:         scan.path.clone(),
        display_path: scan.display.clone(),
        line_number:  idx + 1,
        line_text:    text.trim().chars().take(MAX_LINE_TEXT).collect(),
      }));
    }

    self.current = None;
    None
  }
}

impl Iterator for Hits {
  type Item = SearchHit;

  fn next(&mut self) -> Option<SearchHit> {
    while !self.done {
      match self.scan_current() {
        Some(Ok(hit)) => return Some(hit),
        Some(Err(truncation)) => {
          self.finish(Some(truncation));
          return None;
        },
        None => {},
      }

      if self.files.is_none() {
        match self.search.files(&self.cancel) {
          Some(files) => self.files = Some(files.into_iter()),
          None => {
            self.finish(Some(Truncation::Cancelled));
            return None;
          },
        }
      }
      let Some(path) = self.files.as_mut().and_then(Iterator::next) else {
        self.finish(None);
        return None;
      };

      if self.cancel.is_cancelled() {
        self.finish(Some(Truncation::Cancelled));
        return None;
      }
      if self.summary.files_scanned >= self.search.options.max_files {
        self.finish(Some(Truncation::FileLimit));
        return None;
      }

      self.summary.files_scanned += 1;
      match self.open(&path) {
        Ok(doc) => {
          self.current = Some(FileScan {
            display: display_relative(&path, &self.search.root),
            path,
            doc,
            line: 0,
            has_hit: false,
          });
        },
        Err(reason) => {
          log::warn!("skipping {}: {reason}", path.display());
          self.summary.skipped.push(SkippedFile { path, reason });
        },
      }
    }
    None
  }
}

impl std::iter::FusedIterator for Hits {}
