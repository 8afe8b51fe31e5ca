//! Functions for working with the host environment.

use std::path::PathBuf;

use eyre::{
  Result,
  WrapErr,
};
use parking_lot::RwLock;

// The cwd is cached so that relative paths keep resolving the same way even
// if the directory is deleted while a search is running.
static CWD: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Get the current working directory.
pub fn current_working_dir() -> Result<PathBuf> {
  if let Some(path) = &*CWD.read() {
    return Ok(path.clone());
  }

  // implementation of crossplatform pwd -L
  // we want pwd -L so that symlinked directories are handled correctly
  let mut cwd = std::env::current_dir().wrap_err("failed to get current working directory")?;

  let pwd = std::env::var_os("PWD");
  #[cfg(windows)]
  let pwd = pwd.or_else(|| std::env::var_os("CD"));

  if let Some(pwd) = pwd.map(PathBuf::from)
    && pwd.canonicalize().ok().as_ref() == Some(&cwd)
  {
    cwd = pwd;
  }

  let mut dst = CWD.write();
  *dst = Some(cwd.clone());

  Ok(cwd)
}
