//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).

use std::time::Duration;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Fetch the next snapshot after `delay`.
    ///
    /// Only emitted at startup and when the previous poll settles, so at
    /// most one poll is ever pending.
    SchedulePoll { delay: Duration },

    /// Fetch the address descriptor once.
    FetchAddress,

    /// Copy text to the clipboard.
    CopyToClipboard { text: String },
}
