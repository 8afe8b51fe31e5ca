use std::{
  borrow::Cow,
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::{
  Context,
  Result,
};
use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use serde::Deserialize;
use the_lib::{
  diff::{
    AlignOptions,
    DEFAULT_MAX_LINES,
  },
  document::Decoding,
  replace::{
    REPLACE_LIMIT,
    ReplaceOptions,
  },
};
use the_search::{
  DEFAULT_FILTER,
  DEFAULT_MAX_FILE_SIZE,
  DEFAULT_MAX_FILES,
  DEFAULT_MAX_HITS,
  TreeSearchOptions,
};
use the_stdx::{
  env::current_working_dir,
  path,
};
use toml::Value;

/// Directory a workspace keeps its local configuration in.
const WORKSPACE_DIR: &str = ".the-finder";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
  pub search:  SearchConfig,
  pub replace: ReplaceConfig,
  pub diff:    DiffConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SearchConfig {
  pub max_hits:       usize,
  pub max_files:      usize,
  /// Bytes. Larger files are skipped.
  pub max_file_size:  u64,
  /// Glob filter used when `grep` gets no `--filter`.
  pub default_filter: String,
  pub hidden:         bool,
  /// Read files that are not UTF-8 as Windows-1252 instead of skipping them.
  pub lossy_decoding: bool,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      max_hits:       DEFAULT_MAX_HITS,
      max_files:      DEFAULT_MAX_FILES,
      max_file_size:  DEFAULT_MAX_FILE_SIZE,
      default_filter: DEFAULT_FILTER.to_string(),
      hidden:         false,
      lossy_decoding: false,
    }
  }
}

impl SearchConfig {
  pub fn decoding(&self) -> Decoding {
    if self.lossy_decoding {
      Decoding::Lossy
    } else {
      Decoding::Strict
    }
  }

  pub fn options(&self) -> TreeSearchOptions {
    TreeSearchOptions {
      max_hits:      self.max_hits,
      max_files:     self.max_files,
      max_file_size: self.max_file_size,
      hidden:        self.hidden,
      decoding:      self.decoding(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ReplaceConfig {
  pub limit: usize,
}

impl Default for ReplaceConfig {
  fn default() -> Self {
    Self {
      limit: REPLACE_LIMIT,
    }
  }
}

impl ReplaceConfig {
  pub fn options(&self) -> ReplaceOptions {
    ReplaceOptions { limit: self.limit }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct DiffConfig {
  pub max_lines: usize,
  pub autojunk:  bool,
}

impl Default for DiffConfig {
  fn default() -> Self {
    Self {
      max_lines: DEFAULT_MAX_LINES,
      autojunk:  true,
    }
  }
}

impl DiffConfig {
  pub fn options(&self) -> AlignOptions {
    AlignOptions {
      autojunk:  self.autojunk,
      max_lines: self.max_lines,
    }
  }
}

impl Config {
  /// Loads the user config (`specified_file` or `<config dir>/config.toml`)
  /// with the workspace config merged on top. Missing files are fine.
  pub fn load_default(specified_file: Option<&Path>) -> Result<Config> {
    let global = match specified_file {
      Some(file) => file.to_path_buf(),
      None => config_dir()?.join("config.toml"),
    };
    Self::load(&global, &workspace_config_file())
  }

  pub fn load(global: &Path, local: &Path) -> Result<Config> {
    let mut merged = Value::Table(toml::Table::new());
    for file in [global, local] {
      if let Some(value) = read_toml(file)? {
        log::debug!("loaded config from {}", file.display());
        merged = merge_toml_values(merged, value, 3);
      }
    }
    merged.try_into().context("invalid configuration")
  }
}

fn read_toml(file: &Path) -> Result<Option<Value>> {
  match fs::read_to_string(file) {
    Ok(text) => {
      toml::from_str(&text)
        .map(Some)
        .with_context(|| format!("failed to parse {}", file.display()))
    },
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(err) => Err(err).with_context(|| format!("failed to read {}", file.display())),
  }
}

pub fn config_dir() -> Result<PathBuf> {
  if let Ok(dir) = std::env::var("THE_FINDER_CONFIG_DIR") {
    return Ok(path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned());
  }
  let strategy = choose_base_strategy().context("unable to find the config directory")?;
  Ok(strategy.config_dir().join("the-finder"))
}

pub fn cache_dir() -> Result<PathBuf> {
  if let Ok(dir) = std::env::var("THE_FINDER_CACHE_DIR") {
    return Ok(path::expand_tilde(Cow::Borrowed(Path::new(&dir))).into_owned());
  }
  let strategy = choose_base_strategy().context("unable to find the cache directory")?;
  Ok(strategy.cache_dir().join("the-finder"))
}

pub fn default_log_file() -> Result<PathBuf> {
  Ok(cache_dir()?.join("the-finder.log"))
}

pub fn workspace_config_file() -> PathBuf {
  find_workspace().0.join(WORKSPACE_DIR).join("config.toml")
}

/// Walks up from the working directory to the first directory holding a
/// `.git`, `.svn`, `.jj` or `.the-finder` entry. Returns `(cwd, true)` when
/// there is none.
pub fn find_workspace() -> (PathBuf, bool) {
  match current_working_dir() {
    Ok(current_dir) => find_workspace_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if [".git", ".svn", ".jj", WORKSPACE_DIR]
      .iter()
      .any(|marker| ancestor.join(marker).exists())
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

/// Merges `right` onto `left`. Tables are merged key by key up to
/// `merge_depth` levels; below that, and for every other kind of value, the
/// right side wins.
pub fn merge_toml_values(left: Value, right: Value, merge_depth: usize) -> Value {
  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (key, rvalue) in right_map {
        let merged = match left_map.remove(&key) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(key, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}
