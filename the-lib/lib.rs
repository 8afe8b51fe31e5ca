//! Search, replace and line alignment over immutable document snapshots.
//!
//! Every operation reads a [`document::Document`] (or a rope slice) and
//! returns values: matches, edit descriptions, opcodes. Applying edits is up
//! to the owner of the text.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod cancel;
pub mod compare;
pub mod diff;
pub mod document;
pub mod edit;
pub mod error;
pub mod history;
pub mod position;
pub mod query;
pub mod replace;
pub mod search;

pub use error::{
  Error,
  Result,
};

pub type Tendril = SmartString<LazyCompact>;
