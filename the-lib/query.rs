//! Search queries and their compiled form.

use std::{
  fmt,
  sync::Arc,
};

use ropey::RopeSlice;
use the_stdx::rope::{
  Config,
  Regex,
  RegexBuilder,
};

use crate::error::{
  Error,
  Result,
};

/// What to look for and how.
///
/// A literal query (`is_regex == false`) matches its pattern verbatim. Case
/// folding uses Unicode simple case folding for literal and regex patterns
/// alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
  pub pattern:        String,
  pub is_regex:       bool,
  pub case_sensitive: bool,
  pub whole_word:     bool,
  pub wrap_around:    bool,
}

impl Query {
  /// A case-insensitive literal query that wraps around.
  pub fn new(pattern: impl Into<String>) -> Self {
    Self {
      pattern:        pattern.into(),
      is_regex:       false,
      case_sensitive: false,
      whole_word:     false,
      wrap_around:    true,
    }
  }

  pub fn regex(mut self, is_regex: bool) -> Self {
    self.is_regex = is_regex;
    self
  }

  pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
    self.case_sensitive = case_sensitive;
    self
  }

  pub fn whole_word(mut self, whole_word: bool) -> Self {
    self.whole_word = whole_word;
    self
  }

  pub fn wrap_around(mut self, wrap_around: bool) -> Self {
    self.wrap_around = wrap_around;
    self
  }

  /// Compiles the pattern. Fails with [`Error::Pattern`] for a malformed
  /// regex; an empty pattern compiles to a query that never matches.
  pub fn compile(&self) -> Result<CompiledQuery> {
    if self.pattern.is_empty() {
      return Ok(CompiledQuery {
        query: self.clone(),
        regex: None,
      });
    }

    let source = if self.is_regex {
      self.pattern.clone()
    } else {
      regex::escape(&self.pattern)
    };
    let regex = RegexBuilder::new()
      .syntax(
        Config::new()
          .case_insensitive(!self.case_sensitive)
          .multi_line(true)
          .crlf(true),
      )
      .build(&source)
      .map_err(|err| {
        Error::Pattern {
          pattern: self.pattern.clone(),
          message: err.to_string(),
        }
      })?;

    Ok(CompiledQuery {
      query: self.clone(),
      regex: Some(regex),
    })
  }
}

/// A [`Query`] together with its compiled regex.
pub struct CompiledQuery {
  query: Query,
  regex: Option<Regex>,
}

impl CompiledQuery {
  pub fn query(&self) -> &Query {
    &self.query
  }

  /// `None` for an empty pattern.
  pub fn regex(&self) -> Option<&Regex> {
    self.regex.as_ref()
  }

  pub fn whole_word(&self) -> bool {
    self.query.whole_word
  }

  pub fn wrap_around(&self) -> bool {
    self.query.wrap_around
  }

  /// Whether `text` contains at least one match.
  pub fn is_match(&self, text: RopeSlice) -> bool {
    crate::search::highlight_all(text, self).next().is_some()
  }
}

impl fmt::Debug for CompiledQuery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CompiledQuery")
      .field("query", &self.query)
      .field("compiled", &self.regex.is_some())
      .finish()
  }
}

/// Remembers the last compiled query so that repeated navigation with the
/// same [`Query`] does not recompile it. Owned by one caller.
#[derive(Debug, Default)]
pub struct QueryCache {
  last: Option<Arc<CompiledQuery>>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&mut self, query: &Query) -> Result<Arc<CompiledQuery>> {
    if let Some(compiled) = &self.last
      && compiled.query == *query
    {
      return Ok(Arc::clone(compiled));
    }

    let compiled = Arc::new(query.compile()?);
    self.last = Some(Arc::clone(&compiled));
    Ok(compiled)
  }

  pub fn clear(&mut self) {
    self.last = None;
  }
}
