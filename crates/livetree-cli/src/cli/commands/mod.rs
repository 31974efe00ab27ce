//! CLI command handlers.

pub mod config;
pub mod get;
pub mod view;
