use std::{
  io::Write,
  ops::Range,
  path::Path,
};

use anyhow::{
  Context,
  Result,
};
use ropey::RopeSlice;
use the_lib::{
  cancel::CancelToken,
  compare::DiffNavigator,
  document::Document,
  position::pos_at_coords,
  query::Query,
  replace::{
    ReplaceOptions,
    replace_all,
  },
  search::{
    Match,
    count_all,
    find_next,
    find_previous,
    highlight_all,
  },
};
use the_search::TreeSearch;

use crate::{
  cli::{
    Command,
    Direction,
  },
  config::Config,
};

/// Runs `command`, writing results to `out` and status lines to `status`.
/// Returns whether anything was found (or, for `diff`, whether the files are
/// identical).
pub fn run(
  command: Command,
  config: &Config,
  out: &mut dyn Write,
  status: &mut dyn Write,
) -> Result<bool> {
  match command {
    Command::Find {
      file,
      query,
      from,
      direction,
    } => {
      let doc = load(&file, config)?;
      let compiled = query.compile()?;
      let text = doc.full_text();
      let from = pos_at_coords(text, from);
      let found = match direction {
        Direction::Forward => find_next(text, &compiled, from),
        Direction::Backward => find_previous(text, &compiled, from),
      };
      match found {
        Some(mat) => {
          print_match(out, text, &mat)?;
          Ok(true)
        },
        None => {
          writeln!(status, "No match for '{}'", query.pattern)?;
          Ok(false)
        },
      }
    },
    Command::List { file, query } => {
      let doc = load(&file, config)?;
      let compiled = query.compile()?;
      let text = doc.full_text();
      let mut count = 0;
      for mat in highlight_all(text, &compiled) {
        print_match(out, text, &mat)?;
        count += 1;
      }
      writeln!(status, "{count} match(es)")?;
      Ok(count > 0)
    },
    Command::Count { file, query } => {
      let doc = load(&file, config)?;
      let count = count_all(doc.full_text(), &query.compile()?);
      writeln!(out, "{count}")?;
      Ok(count > 0)
    },
    Command::Replace {
      file,
      query,
      replacement,
      in_place,
      limit,
    } => {
      replace(
        &file,
        &query,
        &replacement,
        in_place,
        limit,
        config,
        out,
        status,
      )
    },
    Command::Diff {
      left,
      right,
      autojunk,
    } => diff(&left, &right, autojunk, config, out, status),
    Command::Grep {
      root,
      query,
      filter,
      hidden,
      max_hits,
    } => {
      let filter = filter.unwrap_or_else(|| config.search.default_filter.clone());
      let mut options = config.search.options();
      options.hidden |= hidden;
      if let Some(max_hits) = max_hits {
        options.max_hits = max_hits;
      }

      let search = TreeSearch::new(&root, &filter, &query, options)?;
      let handle = search.spawn(CancelToken::new());
      let mut found = false;
      for hit in handle.iter() {
        writeln!(out, "{}:{}: {}", hit.display_path, hit.line_number, hit.line_text)?;
        found = true;
      }
      let summary = handle.join();
      for skipped in &summary.skipped {
        writeln!(status, "skipped {}: {}", skipped.path.display(), skipped.reason)?;
      }
      writeln!(status, "{summary}")?;
      Ok(found)
    },
  }
}

fn load(file: &Path, config: &Config) -> Result<Document> {
  Ok(Document::load(file, config.search.decoding())?)
}

fn print_match(out: &mut dyn Write, text: RopeSlice, mat: &Match) -> Result<()> {
  let matched = text.slice(mat.char_range());
  writeln!(out, "{}: {}", mat.coords(text), matched)?;
  Ok(())
}

#[allow(clippy::too_many_arguments)]
fn replace(
  file: &Path,
  query: &Query,
  replacement: &str,
  in_place: bool,
  limit: Option<usize>,
  config: &Config,
  out: &mut dyn Write,
  status: &mut dyn Write,
) -> Result<bool> {
  let doc = load(file, config)?;
  let compiled = query.compile()?;
  let options = match limit {
    Some(limit) => ReplaceOptions { limit },
    None => config.replace.options(),
  };
  let result = replace_all(
    &doc,
    &compiled,
    replacement,
    &options,
    &CancelToken::new(),
  )?;

  if in_place {
    if result.count() > 0 {
      let bytes = doc
        .with_text(result.text.clone())
        .to_bytes()
        .with_context(|| format!("cannot write {} back", file.display()))?;
      std::fs::write(file, bytes).with_context(|| format!("failed to write {}", file.display()))?;
    }
  } else {
    for chunk in result.text.chunks() {
      out.write_all(chunk.as_bytes())?;
    }
  }
  writeln!(status, "{result}")?;
  Ok(result.count() > 0)
}

fn diff(
  left: &Path,
  right: &Path,
  autojunk: Option<bool>,
  config: &Config,
  out: &mut dyn Write,
  status: &mut dyn Write,
) -> Result<bool> {
  let left = load(left, config)?;
  let right = load(right, config)?;
  let mut options = config.diff.options();
  if let Some(autojunk) = autojunk {
    options.autojunk = autojunk;
  }

  let mut navigator = DiffNavigator::default();
  let comparison = navigator.compare(&left, &right, &options, &CancelToken::new())?;
  for _ in 0..navigator.len() {
    let Some(group) = navigator.next().cloned() else {
      break;
    };
    writeln!(
      out,
      "{} ({}): left {}, right {}",
      navigator.status().unwrap_or_default(),
      group.kind.as_str(),
      describe_lines(&group.left_range),
      describe_lines(&group.right_range),
    )?;
    for line in group.left_range.clone().filter_map(|idx| left.line(idx)) {
      writeln!(out, "- {line}")?;
    }
    for line in group.right_range.clone().filter_map(|idx| right.line(idx)) {
      writeln!(out, "+ {line}")?;
    }
  }
  writeln!(status, "{comparison}")?;
  Ok(comparison.is_identical())
}

/// 1-based line range for display.
fn describe_lines(range: &Range<usize>) -> String {
  match range.len() {
    0 => format!("after line {}", range.start),
    1 => format!("line {}", range.start + 1),
    _ => format!("lines {}-{}", range.start + 1, range.end),
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::*;
  use crate::config::SearchConfig;

  fn run_ok(command: Command) -> (bool, String, String) {
    let mut out = Vec::new();
    let mut status = Vec::new();
    let found = run(command, &Config::default(), &mut out, &mut status).unwrap();
    (
      found,
      String::from_utf8(out).unwrap(),
      String::from_utf8(status).unwrap(),
    )
  }

  #[test]
  fn find_reports_one_based_position() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "one\ntwo foo\nfoo\n").unwrap();

    let (found, out, _) = run_ok(Command::Find {
      file:      file.clone(),
      query:     Query::new("FOO"),
      from:      Default::default(),
      direction: Direction::Forward,
    });
    assert!(found);
    assert_eq!(out, "2:5: foo\n");

    let (_, out, _) = run_ok(Command::Find {
      file,
      query: Query::new("foo"),
      from: Default::default(),
      direction: Direction::Backward,
    });
    assert_eq!(out, "3:1: foo\n");
  }

  #[test]
  fn list_and_count() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "foo foo\nfoo\n").unwrap();

    let (_, out, status) = run_ok(Command::List {
      file:  file.clone(),
      query: Query::new("foo"),
    });
    assert_eq!(out, "1:1: foo\n1:5: foo\n2:1: foo\n");
    assert_eq!(status, "3 match(es)\n");

    let (found, out, _) = run_ok(Command::Count {
      file,
      query: Query::new("bar"),
    });
    assert!(!found);
    assert_eq!(out, "0\n");
  }

  #[test]
  fn replace_in_place_keeps_other_text() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "foo foo foo\n").unwrap();

    let (found, out, status) = run_ok(Command::Replace {
      file:        file.clone(),
      query:       Query::new("foo"),
      replacement: "bar".into(),
      in_place:    true,
      limit:       None,
    });
    assert!(found);
    assert!(out.is_empty());
    assert_eq!(status, "Replaced 3 occurrence(s)\n");
    assert_eq!(fs::read_to_string(&file).unwrap(), "bar bar bar\n");
  }

  #[test]
  fn replace_prints_result_without_writing() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "a1 b22\n").unwrap();

    let (_, out, _) = run_ok(Command::Replace {
      file:        file.clone(),
      query:       Query::new(r"(\w)(\d+)").regex(true),
      replacement: "$2$1".into(),
      in_place:    false,
      limit:       Some(1),
    });
    assert_eq!(out, "1a b22\n");
    assert_eq!(fs::read_to_string(&file).unwrap(), "a1 b22\n");
  }

  #[test]
  fn replace_in_place_refuses_unencodable_text() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("latin1.txt");
    fs::write(&file, b"caf\xE9 x\n").unwrap();
    let config = Config {
      search: SearchConfig {
        lossy_decoding: true,
        ..Default::default()
      },
      ..Default::default()
    };

    let result = run(
      Command::Replace {
        file:        file.clone(),
        query:       Query::new("x"),
        replacement: "\u{65e5}".into(),
        in_place:    true,
        limit:       None,
      },
      &config,
      &mut Vec::new(),
      &mut Vec::new(),
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("cannot write"));
    assert_eq!(fs::read(&file).unwrap(), b"caf\xE9 x\n");

    let found = run(
      Command::Replace {
        file:        file.clone(),
        query:       Query::new("x"),
        replacement: "\u{e9}".into(),
        in_place:    true,
        limit:       None,
      },
      &config,
      &mut Vec::new(),
      &mut Vec::new(),
    )
    .unwrap();
    assert!(found);
    assert_eq!(fs::read(&file).unwrap(), b"caf\xE9 \xE9\n");
  }

  #[test]
  fn diff_walks_every_group() {
    let dir = tempdir().unwrap();
    let left = dir.path().join("left.txt");
    let right = dir.path().join("right.txt");
    fs::write(&left, "a\nb\nc\n").unwrap();
    fs::write(&right, "a\nx\nc\nd\n").unwrap();

    let (identical, out, status) = run_ok(Command::Diff {
      left:     left.clone(),
      right:    right.clone(),
      autojunk: None,
    });
    assert!(!identical);
    assert_eq!(
      out,
      "Diff 1 of 2 (changed): left line 2, right line 2\n- b\n+ x\nDiff 2 of 2 (added): left after \
       line 3, right line 4\n+ d\n"
    );
    assert_eq!(status, "2 difference(s) found\n");

    let (identical, out, status) = run_ok(Command::Diff {
      left:     left.clone(),
      right:    left,
      autojunk: Some(false),
    });
    assert!(identical);
    assert!(out.is_empty());
    assert_eq!(status, "Files are identical\n");
  }

  #[test]
  fn grep_streams_hits_and_summary() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "first\ntodo: fix\n").unwrap();
    fs::write(dir.path().join("main.rs"), "// TODO\n").unwrap();

    let (found, out, status) = run_ok(Command::Grep {
      root:     dir.path().to_path_buf(),
      query:    Query::new("TODO"),
      filter:   Some("*.txt".into()),
      hidden:   false,
      max_hits: None,
    });
    assert!(found);
    assert_eq!(out, "notes.txt:2: todo: fix\n");
    assert_eq!(status, "Found 1 match(es) in 1 file(s)\n");
  }

  #[test]
  fn bad_pattern_is_an_error() {
    let dir = tempdir().unwrap();
    let result = run(
      Command::Grep {
        root:     dir.path().to_path_buf(),
        query:    Query::new("(").regex(true),
        filter:   None,
        hidden:   false,
        max_hits: None,
      },
      &Config::default(),
      &mut Vec::new(),
      &mut Vec::new(),
    );
    assert!(result.is_err());
  }
}
