//! Benchmarks for scanning, replacing and aligning in the-lib.
//!
//! Run with: `cargo bench -p the-lib --bench search`

use divan::{
  Bencher,
  black_box,
};
use ropey::Rope;
use the_lib::{
  cancel::CancelToken,
  diff::align,
  document::Document,
  query::Query,
  replace::{
    ReplaceOptions,
    replace_all,
  },
  search::{
    count_all,
    find_previous,
  },
};

fn main() {
  divan::main();
}

fn make_ascii_text(size: usize) -> String {
  let line = "The quick brown fox jumps over the lazy dog.\n";
  let mut s = String::with_capacity(size);
  while s.len() < size {
    s.push_str(line);
  }
  s.truncate(size);
  s
}

fn make_lines(count: usize, every: usize, tag: &str) -> Vec<String> {
  (0..count)
    .map(|idx| {
      if idx % every == 0 {
        format!("{tag} line {idx}")
      } else {
        format!("shared line {idx}")
      }
    })
    .collect()
}

mod scan {
  use super::*;

  const SIZE: usize = 256 * 1024;

  #[divan::bench(args = [false, true])]
  fn count_literal(bencher: Bencher, case_sensitive: bool) {
    let text = Rope::from(make_ascii_text(SIZE));
    let query = Query::new("fox").case_sensitive(case_sensitive).compile().unwrap();
    bencher.bench(|| count_all(black_box(text.slice(..)), &query));
  }

  #[divan::bench]
  fn count_whole_word_regex(bencher: Bencher) {
    let text = Rope::from(make_ascii_text(SIZE));
    let query = Query::new(r"\w+o\w*")
      .regex(true)
      .whole_word(true)
      .compile()
      .unwrap();
    bencher.bench(|| count_all(black_box(text.slice(..)), &query));
  }

  #[divan::bench]
  fn previous_from_end(bencher: Bencher) {
    let text = Rope::from(make_ascii_text(SIZE));
    let query = Query::new("lazy").compile().unwrap();
    let end = text.len_chars();
    bencher.bench(|| find_previous(black_box(text.slice(..)), &query, end));
  }
}

mod replace {
  use super::*;

  #[divan::bench(args = [16 * 1024, 128 * 1024])]
  fn replace_every_word(bencher: Bencher, size: usize) {
    let doc = Document::from(make_ascii_text(size));
    let query = Query::new("the").compile().unwrap();
    let options = ReplaceOptions::default();
    let cancel = CancelToken::new();
    bencher.bench(|| {
      let result = replace_all(black_box(&doc), &query, "a", &options, &cancel).unwrap();
      black_box(result);
    });
  }
}

mod diff {
  use super::*;

  #[divan::bench(args = [100, 1000, 5000])]
  fn sparse_changes(bencher: Bencher, lines: usize) {
    let left = make_lines(lines, 50, "left");
    let right = make_lines(lines, 37, "right");
    bencher.bench(|| align(black_box(&left), black_box(&right)));
  }
}
