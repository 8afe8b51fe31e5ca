use std::path::PathBuf;

use anyhow::Result;
use clap::{
  ArgAction,
  Args,
  Parser,
  Subcommand,
};
use the_lib::{
  position::Position,
  query::Query,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub command:     Command,
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
}

#[derive(Clone, Debug)]
pub enum Command {
  Find {
    file:      PathBuf,
    query:     Query,
    from:      Position,
    direction: Direction,
  },
  /// Every match of the query, in order.
  List { file: PathBuf, query: Query },
  Count { file: PathBuf, query: Query },
  Replace {
    file:        PathBuf,
    query:       Query,
    replacement: String,
    in_place:    bool,
    limit:       Option<usize>,
  },
  Diff {
    left:     PathBuf,
    right:    PathBuf,
    autojunk: Option<bool>,
  },
  Grep {
    root:     PathBuf,
    query:    Query,
    filter:   Option<String>,
    hidden:   bool,
    max_hits: Option<usize>,
  },
}

#[derive(Parser, Debug)]
#[command(name = "the-finder", about, long_about = None, version)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", value_parser = parse_pathbuf, global = true)]
  config_file: Option<PathBuf>,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Args, Debug)]
struct QueryArgs {
  /// Text to look for
  pattern: String,

  /// Treat the pattern as a regular expression
  #[arg(short = 'e', long = "regex")]
  regex: bool,

  /// Match case exactly
  #[arg(short = 's', long = "case-sensitive")]
  case_sensitive: bool,

  /// Only match whole words
  #[arg(short = 'w', long = "whole-word")]
  whole_word: bool,

  /// Do not wrap around the end of the file
  #[arg(long = "no-wrap")]
  no_wrap: bool,
}

impl From<QueryArgs> for Query {
  fn from(args: QueryArgs) -> Self {
    Query::new(args.pattern)
      .regex(args.regex)
      .case_sensitive(args.case_sensitive)
      .whole_word(args.whole_word)
      .wrap_around(!args.no_wrap)
  }
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// Find the next (or previous) match from a position
  Find {
    #[arg(value_parser = parse_pathbuf)]
    file: PathBuf,

    #[command(flatten)]
    query: QueryArgs,

    /// Start at LINE[:COL] (1-based)
    #[arg(long = "from", value_name = "LINE[:COL]", value_parser = parse_position)]
    from: Option<Position>,

    /// Search backwards from the start position
    #[arg(short = 'b', long = "backward")]
    backward: bool,

    /// List every match instead
    #[arg(short = 'a', long = "all", conflicts_with_all = ["from", "backward"])]
    all: bool,
  },
  /// Count the matches in a file
  Count {
    #[arg(value_parser = parse_pathbuf)]
    file: PathBuf,

    #[command(flatten)]
    query: QueryArgs,
  },
  /// Replace every match in a file
  Replace {
    #[arg(value_parser = parse_pathbuf)]
    file: PathBuf,

    #[command(flatten)]
    query: QueryArgs,

    /// Replacement text; `$1` and `${name}` expand in regex mode
    replacement: String,

    /// Write the result back to the file instead of printing it
    #[arg(short = 'i', long = "in-place")]
    in_place: bool,

    /// Stop after this many replacements
    #[arg(long = "limit", value_name = "N")]
    limit: Option<usize>,
  },
  /// Compare two files line by line
  Diff {
    #[arg(value_parser = parse_pathbuf)]
    left: PathBuf,

    #[arg(value_parser = parse_pathbuf)]
    right: PathBuf,

    /// Let frequent lines anchor matches too
    #[arg(long = "no-autojunk")]
    no_autojunk: bool,
  },
  /// Search every matching file under a directory
  Grep {
    #[command(flatten)]
    query: QueryArgs,

    /// Directory to search
    #[arg(value_parser = parse_pathbuf, default_value = ".")]
    root: PathBuf,

    /// Semicolon-separated file globs, e.g. `*.rs;*.toml`
    #[arg(short = 'f', long = "filter", value_name = "GLOBS")]
    filter: Option<String>,

    /// Include hidden files and directories
    #[arg(long = "hidden")]
    hidden: bool,

    /// Stop after this many matching lines
    #[arg(long = "max-hits", value_name = "N")]
    max_hits: Option<usize>,
  },
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let command = match raw.command {
      RawCommand::Find {
        file,
        query,
        all: true,
        ..
      } => {
        Command::List {
          file,
          query: query.into(),
        }
      },
      RawCommand::Find {
        file,
        query,
        from,
        backward,
        all: false,
      } => {
        Command::Find {
          file,
          query: query.into(),
          from: from.unwrap_or_default(),
          direction: if backward {
            Direction::Backward
          } else {
            Direction::Forward
          },
        }
      },
      RawCommand::Count { file, query } => {
        Command::Count {
          file,
          query: query.into(),
        }
      },
      RawCommand::Replace {
        file,
        query,
        replacement,
        in_place,
        limit,
      } => {
        if limit == Some(0) {
          anyhow::bail!("--limit must be at least 1");
        }
        Command::Replace {
          file,
          query: query.into(),
          replacement,
          in_place,
          limit,
        }
      },
      RawCommand::Diff {
        left,
        right,
        no_autojunk,
      } => {
        Command::Diff {
          left,
          right,
          autojunk: no_autojunk.then_some(false),
        }
      },
      RawCommand::Grep {
        query,
        root,
        filter,
        hidden,
        max_hits,
      } => {
        Command::Grep {
          root,
          query: query.into(),
          filter,
          hidden,
          max_hits,
        }
      },
    };

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      command,
    })
  }
}

fn parse_pathbuf(value: &str) -> std::result::Result<PathBuf, String> {
  Ok(the_stdx::path::canonicalize(value))
}

/// `LINE` or `LINE:COL`, both 1-based.
fn parse_position(value: &str) -> std::result::Result<Position, String> {
  let parse = |part: &str| {
    part
      .parse::<usize>()
      .ok()
      .filter(|n| *n > 0)
      .ok_or_else(|| format!("'{value}' is not a 1-based LINE[:COL]"))
  };
  let (row, col) = match value.split_once(':') {
    Some((row, col)) => (parse(row)?, parse(col)?),
    None => (parse(value)?, 1),
  };
  Ok(Position::new(row - 1, col - 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> CliOptions {
    let raw = RawCli::try_parse_from(std::iter::once("the-finder").chain(args.iter().copied()))
      .expect("arguments should parse");
    raw.try_into().expect("arguments should convert")
  }

  #[test]
  fn positions_are_one_based() {
    assert_eq!(parse_position("3"), Ok(Position::new(2, 0)));
    assert_eq!(parse_position("3:7"), Ok(Position::new(2, 6)));
    assert!(parse_position("0").is_err());
    assert!(parse_position("x:1").is_err());
  }

  #[test]
  fn find_flags_build_the_query() {
    let options = parse(&["-vv", "find", "notes.txt", "fo+", "-e", "-s", "--from", "2:3", "-b"]);
    assert_eq!(options.verbosity, 2);
    let Command::Find {
      file,
      query,
      from,
      direction,
    } = options.command
    else {
      panic!("expected find");
    };
    assert!(file.ends_with("notes.txt"));
    assert!(file.is_absolute());
    assert_eq!(
      query,
      Query::new("fo+").regex(true).case_sensitive(true)
    );
    assert_eq!(from, Position::new(1, 2));
    assert_eq!(direction, Direction::Backward);
  }

  #[test]
  fn find_all_lists() {
    let options = parse(&["find", "a.txt", "x", "--all"]);
    assert!(matches!(options.command, Command::List { .. }));
    assert!(RawCli::try_parse_from(["the-finder", "find", "a.txt", "x", "--all", "-b"]).is_err());
  }

  #[test]
  fn grep_defaults_to_current_dir() {
    let options = parse(&["grep", "TODO", "--filter", "*.txt", "-w"]);
    let Command::Grep {
      root,
      query,
      filter,
      ..
    } = options.command
    else {
      panic!("expected grep");
    };
    assert!(root.is_absolute());
    assert!(query.whole_word);
    assert_eq!(filter.as_deref(), Some("*.txt"));
  }

  #[test]
  fn zero_replace_limit_is_rejected() {
    let raw =
      RawCli::try_parse_from(["the-finder", "replace", "a.txt", "x", "y", "--limit", "0"]).unwrap();
    assert!(CliOptions::try_from(raw).is_err());
  }
}
