//! Effect handlers.
//!
//! Pure async functions that perform one piece of I/O and return the
//! `UiEvent` describing its outcome. Spawning and cancellation belong to the
//! runtime.

use std::time::Duration;

use livetree_core::feed::FeedClient;
use tracing::debug;

use crate::common::Clipboard;
use crate::events::UiEvent;

/// Waits `delay`, then fetches one snapshot.
pub async fn poll_after(client: FeedClient, delay: Duration) -> UiEvent {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    debug!(url = %client.feed_url(), "polling feed");
    UiEvent::PollSettled(client.fetch_snapshot().await)
}

pub async fn fetch_address(client: FeedClient) -> UiEvent {
    UiEvent::AddressLoaded(client.fetch_address().await)
}

/// Copies synchronously; OSC 52 has to be written from the UI thread.
pub fn copy_to_clipboard(text: String) -> UiEvent {
    match Clipboard::copy(&text) {
        Ok(()) => UiEvent::ClipboardCopied { text },
        Err(error) => UiEvent::ClipboardFailed {
            error: error.to_string(),
        },
    }
}
