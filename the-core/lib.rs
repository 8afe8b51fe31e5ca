//! Leaf text primitives shared by every other crate in the workspace.

pub mod chars;
pub mod line_ending;
pub mod offset;
