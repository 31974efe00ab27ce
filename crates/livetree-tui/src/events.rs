//! UI events consumed by the reducer.

use crossterm::event::Event;
use livetree_core::feed::FeedError;
use livetree_core::snapshot::Snapshot;

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick (drives toast expiry and redraws).
    Tick,
    /// Current terminal size, sent before every batch.
    Frame { width: u16, height: u16 },
    /// Raw terminal input.
    Terminal(Event),
    /// A poll request settled.
    PollSettled(Result<Snapshot, FeedError>),
    /// The address descriptor request settled.
    AddressLoaded(Result<String, FeedError>),
    /// Text was placed on the clipboard.
    ClipboardCopied { text: String },
    ClipboardFailed { error: String },
}
