//! Status line feature slice.
//!
//! Bottom bar showing poll health (connectivity, failure streak, age of the
//! last good snapshot), the latest toast and key hints.
//!
//! - `state.rs`: PollStats (mutable counters) and StatusLine (immutable snapshot)
//! - `render.rs`: Status line rendering

mod render;
mod state;

pub use render::render_status_line;
pub use state::{PollStats, StatusLine};
