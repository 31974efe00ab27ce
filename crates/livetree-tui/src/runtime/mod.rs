//! Viewer runtime - owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! Async handlers send their result `UiEvent` to `inbox_tx`; the loop drains
//! `inbox_rx` every iteration. Spawned work races against a
//! `CancellationToken` that is cancelled on drop, so nothing is delivered
//! once the runtime is gone.
//!
//! Structure:
//! - `mod.rs`: Core runtime (TuiRuntime, event loop, effect dispatch)
//! - `inbox.rs`: Inbox channel types
//! - `handlers.rs`: Effect handler implementations

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use livetree_core::config::Config;
use livetree_core::feed::FeedClient;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick interval while the user is interacting.
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Tick interval when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen viewer runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    client: FeedClient,
    /// Inbox sender - handlers send events here.
    inbox_tx: UiEventSender,
    /// Inbox receiver - runtime drains this each loop.
    inbox_rx: UiEventReceiver,
    /// Cancelled on drop; stops pending polls from delivering.
    cancel: CancellationToken,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates a new viewer runtime.
    ///
    /// The feed client is built before the terminal is touched, so a bad URL
    /// is reported on a normal screen.
    pub fn new(config: Config) -> Result<Self> {
        let client = FeedClient::from_config(&config)?;
        let state = AppState::new(config, client.origin());

        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            client,
            inbox_tx,
            inbox_rx,
            cancel: CancellationToken::new(),
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        info!(url = %self.client.feed_url(), "viewer started");

        let effects = update::init(&self.state);
        self.execute_effects(effects);
        let result = self.event_loop();

        let _ = terminal::disable_input_features();
        info!("viewer stopped");
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            // Layout depends on size, so Frame goes first.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                if !matches!(&event, UiEvent::Frame { .. }) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty && !self.state.should_quit {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.last_terminal_event.elapsed() < IDLE_POLL_DURATION {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick only when there is nothing to process.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns an async effect and sends its result event to the inbox,
    /// unless the runtime is cancelled first.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(deliver_unless_cancelled(tx, cancel, f()));
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                debug!("quit requested");
                self.state.should_quit = true;
                self.cancel.cancel();
            }
            UiEffect::SchedulePoll { delay } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::poll_after(client, delay));
            }
            UiEffect::FetchAddress => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::fetch_address(client));
            }
            UiEffect::CopyToClipboard { text } => {
                self.dispatch_event(handlers::copy_to_clipboard(text));
            }
        }
    }
}

/// Runs `fut` and sends its event, unless `cancel` fires first.
///
/// Once cancelled nothing is sent, even if `fut` finished in the same poll.
async fn deliver_unless_cancelled<Fut>(tx: UiEventSender, cancel: CancellationToken, fut: Fut)
where
    Fut: Future<Output = UiEvent>,
{
    tokio::select! {
        () = cancel.cancelled() => {}
        event = fut => {
            if !cancel.is_cancelled() {
                let _ = tx.send(event);
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = terminal::restore_terminal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> FeedClient {
        FeedClient::new("http://127.0.0.1:9/json", None, Duration::from_millis(200)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_poll_never_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let pending = tokio::spawn(deliver_unless_cancelled(
            tx,
            cancel.clone(),
            handlers::poll_after(unreachable_client(), Duration::from_secs(1)),
        ));

        cancel.cancel();
        tokio::time::advance(Duration::from_secs(2)).await;
        pending.await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_poll_delivers_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let pending = tokio::spawn(deliver_unless_cancelled(
            tx,
            cancel,
            handlers::poll_after(unreachable_client(), Duration::from_secs(1)),
        ));

        tokio::time::advance(Duration::from_secs(2)).await;
        pending.await.unwrap();

        assert!(matches!(rx.try_recv(), Ok(UiEvent::PollSettled(Err(_)))));
        assert!(rx.try_recv().is_err());
    }
}
