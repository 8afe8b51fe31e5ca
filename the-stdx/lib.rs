//! Extensions to the standard library and to ropey used across the workspace.

pub mod env;
pub mod path;
pub mod rope;
