use std::{
  io,
  process::ExitCode,
};

use anyhow::Result;

use crate::{
  cli::CliOptions,
  config::Config,
};

mod cli;
mod commands;
mod config;
mod logging;

fn main() -> Result<ExitCode> {
  let options = CliOptions::parse()?;

  let log_file = match options.log_file {
    Some(file) => file,
    None => config::default_log_file()?,
  };
  logging::setup_logging(options.verbosity, &log_file)?;

  let config = Config::load_default(options.config_file.as_deref())?;
  log::debug!("running {:?} with {config:?}", options.command);

  let found = commands::run(
    options.command,
    &config,
    &mut io::stdout().lock(),
    &mut io::stderr().lock(),
  )?;
  Ok(if found {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}
