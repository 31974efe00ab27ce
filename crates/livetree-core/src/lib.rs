//! Core livetree library (bus, paths, node state, favorites, tree model, feed, config).

pub mod bus;
pub mod config;
pub mod favorites;
pub mod feed;
pub mod logging;
pub mod node_state;
pub mod path;
pub mod snapshot;
pub mod tree;
