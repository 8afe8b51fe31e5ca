//! Functions for working with [`Path`].

use std::{
  borrow::Cow,
  path::{
    Component,
    Path,
    PathBuf,
  },
};

use crate::env::current_working_dir;

/// Replaces a leading `~` with the home directory.
pub fn expand_tilde<'a, P>(path: P) -> Cow<'a, Path>
where
  P: Into<Cow<'a, Path>>,
{
  let path = path.into();
  let mut components = path.components();
  if let Some(Component::Normal(c)) = components.next()
    && c == "~"
    && let Ok(mut home) = etcetera::home_dir()
  {
    home.push(components);
    return Cow::Owned(home);
  }

  path
}

/// Normalize a path without resolving symlinks: `.` components are dropped
/// and `..` pops the previous component.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let mut ret = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::Prefix(_) | Component::RootDir => ret.push(component.as_os_str()),
      Component::CurDir => {},
      Component::ParentDir => {
        ret.pop();
      },
      Component::Normal(c) => ret.push(c),
    }
  }
  ret
}

/// Returns the canonical, absolute form of a path with all intermediate
/// components normalized. Does not touch the file system, so the path does
/// not need to exist.
pub fn canonicalize(path: impl AsRef<Path>) -> PathBuf {
  let path = expand_tilde(path.as_ref());
  let path = if path.is_relative() {
    match current_working_dir() {
      Ok(cwd) => Cow::Owned(cwd.join(path)),
      Err(_) => path,
    }
  } else {
    path
  };

  normalize(path)
}

/// `path` relative to `root`, with `/` separators on every platform. Paths
/// outside `root` are returned whole.
pub fn display_relative(path: &Path, root: &Path) -> String {
  let rel = path.strip_prefix(root).unwrap_or(path);
  let display = rel.to_string_lossy();
  if std::path::MAIN_SEPARATOR != '/' {
    display.replace(std::path::MAIN_SEPARATOR, "/")
  } else {
    display.into_owned()
  }
}
