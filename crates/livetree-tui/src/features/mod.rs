//! Feature slices for the TUI.

pub mod statusline;
pub mod tree;
