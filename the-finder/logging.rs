use std::path::Path;

use anyhow::{
  Context,
  Result,
};

/// Sends `log` records to `log_file`. Verbosity 0 logs warnings, each `-v`
/// adds a level up to trace.
pub fn setup_logging(verbosity: u8, log_file: &Path) -> Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  if let Some(parent) = log_file.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let file = fern::log_file(log_file)
    .with_context(|| format!("failed to open log file {}", log_file.display()))?;

  fern::Dispatch::new()
    .level(level)
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(file)
    .apply()
    .context("a logger is already installed")?;

  Ok(())
}
