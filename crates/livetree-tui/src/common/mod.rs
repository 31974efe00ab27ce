//! Shared helpers for the TUI.

pub mod clipboard;
pub mod text;

pub use clipboard::{Clipboard, ClipboardError};
