//! Viewer reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use livetree_core::bus::FAVORITE_DELETE;
use livetree_core::feed::FeedError;
use livetree_core::node_state::StateField;
use livetree_core::path::resolve;
use livetree_core::snapshot::{Snapshot, format_copy};
use tracing::{debug, warn};

use crate::common::text::{sanitize_for_display, truncate_with_ellipsis};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Pane, PaneCursor};

/// Width change of a key per `+`/`-` press.
const KEY_WIDTH_STEP: i64 = 10;

/// Width change of a whole view per `[`/`]` press.
const VIEW_WIDTH_STEP: i64 = 100;

/// Columns moved per `h`/`l` press.
const HORIZONTAL_STEP: isize = 4;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: isize = 3;

/// Longest copied text echoed back in the toast.
const TOAST_PREVIEW_WIDTH: usize = 60;

/// Effects to run once, before the first event.
pub fn init(_app: &AppState) -> Vec<UiEffect> {
    vec![
        UiEffect::SchedulePoll {
            delay: Duration::ZERO,
        },
        UiEffect::FetchAddress,
    ]
}

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    if app.should_quit {
        return vec![];
    }

    match event {
        UiEvent::Tick => {
            if app.toast.as_ref().is_some_and(|toast| toast.is_expired()) {
                app.toast = None;
            }
            vec![]
        }
        UiEvent::Frame { width, height } => {
            if app.viewport != (width, height) {
                app.viewport = (width, height);
                refresh_cursors(app);
            }
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::PollSettled(Ok(snapshot)) => handle_poll_success(app, snapshot),
        UiEvent::PollSettled(Err(error)) => handle_poll_failure(app, &error),
        UiEvent::AddressLoaded(Ok(address)) => {
            debug!(%address, "address loaded");
            app.address = address;
            vec![]
        }
        UiEvent::AddressLoaded(Err(error)) => {
            warn!(%error, "address lookup failed, keeping {}", app.address);
            vec![]
        }
        UiEvent::ClipboardCopied { text } => {
            let preview = sanitize_for_display(&text);
            app.show_toast(format!(
                "Copied: {}",
                truncate_with_ellipsis(&preview, TOAST_PREVIEW_WIDTH)
            ));
            vec![]
        }
        UiEvent::ClipboardFailed { error } => {
            warn!(%error, "clipboard copy failed");
            app.show_toast(format!("Copy failed: {error}"));
            vec![]
        }
    }
}

// ============================================================================
// Poll Handlers
// ============================================================================

fn handle_poll_success(app: &mut AppState, snapshot: Snapshot) -> Vec<UiEffect> {
    if !app.poll.connectivity().is_online() {
        debug!(
            failures = app.poll.consecutive_failures(),
            "feed back online"
        );
    }
    app.apply_snapshot(snapshot);
    app.poll.record_success();
    refresh_cursors(app);
    vec![UiEffect::SchedulePoll {
        delay: app.schedule.next_delay(true),
    }]
}

/// Keeps the last good snapshot and retries on the slower schedule.
fn handle_poll_failure(app: &mut AppState, error: &FeedError) -> Vec<UiEffect> {
    app.poll.record_failure(&error.to_string());
    warn!(
        %error,
        failures = app.poll.consecutive_failures(),
        "poll failed"
    );
    vec![UiEffect::SchedulePoll {
        delay: app.schedule.next_delay(false),
    }]
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollDown => scroll_by(app, WHEEL_STEP),
                MouseEventKind::ScrollUp => scroll_by(app, -(WHEEL_STEP)),
                _ => {}
            }
            vec![]
        }
        Event::Resize(width, height) => {
            app.viewport = (width, height);
            refresh_cursors(app);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            return quit(app);
        }
        return vec![];
    }

    match key.code {
        KeyCode::Char('q') => quit(app),
        KeyCode::Esc => {
            app.toast = None;
            vec![]
        }
        KeyCode::Char('j') | KeyCode::Down => {
            move_focus(app, 1);
            vec![]
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_focus(app, -1);
            vec![]
        }
        KeyCode::PageDown => {
            move_focus(app, page(app));
            vec![]
        }
        KeyCode::PageUp => {
            move_focus(app, -page(app));
            vec![]
        }
        KeyCode::Char('h') | KeyCode::Left => {
            scroll_horizontal(app, -(HORIZONTAL_STEP));
            vec![]
        }
        KeyCode::Char('l') | KeyCode::Right => {
            scroll_horizontal(app, HORIZONTAL_STEP);
            vec![]
        }
        KeyCode::Char(' ') | KeyCode::Enter => toggle_focused(app, StateField::Collapsed),
        KeyCode::Char('r') => toggle_focused(app, StateField::Raw),
        KeyCode::Char('C') => toggle_view_default(app, StateField::Collapsed),
        KeyCode::Char('R') => toggle_view_default(app, StateField::Raw),
        KeyCode::Char('+' | '=') => adjust_focused_width(app, KEY_WIDTH_STEP),
        KeyCode::Char('-') => adjust_focused_width(app, -KEY_WIDTH_STEP),
        KeyCode::Char(']') => adjust_view_width(app, VIEW_WIDTH_STEP),
        KeyCode::Char('[') => adjust_view_width(app, -VIEW_WIDTH_STEP),
        KeyCode::Char('c') => copy_focused(app),
        KeyCode::Char('y') => copy_view(app),
        KeyCode::Char('f') => favorite_focused(app),
        KeyCode::Char('d') => unfavorite_focused(app),
        KeyCode::Tab | KeyCode::BackTab => {
            switch_pane(app);
            vec![]
        }
        KeyCode::Char('p') => {
            app.pinned = !app.pinned;
            refresh_cursors(app);
            vec![]
        }
        _ => vec![],
    }
}

fn quit(app: &mut AppState) -> Vec<UiEffect> {
    app.should_quit = true;
    vec![UiEffect::Quit]
}

// ============================================================================
// Controls
// ============================================================================

/// Flips `field` on the focused key, or the view default on a header.
fn toggle_focused(app: &mut AppState, field: StateField) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let Some(key) = target.key.clone() else {
        return toggle_view_default(app, field);
    };

    let snapshot = app.snapshot.clone();
    if let Some(view) = app.view_of_mut(&target) {
        view.toggle(&target.level, &key, field, snapshot.value());
    }
    refresh_cursors(app);
    vec![]
}

/// Flips the focused view's default for `field` and resets its overrides.
fn toggle_view_default(app: &mut AppState, field: StateField) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let snapshot = app.snapshot.clone();
    let Some(view) = app.view_of_mut(&target) else {
        return vec![];
    };
    let on = view.toggle_default(field, snapshot.value());
    let label = view.base().label();

    let state = if on { "on" } else { "off" };
    app.show_toast(format!("{label}: {} default {state}", field.as_str()));
    refresh_cursors(app);
    vec![]
}

fn adjust_focused_width(app: &mut AppState, delta: i64) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let Some(key) = target.key.clone() else {
        return adjust_view_width(app, delta);
    };
    if let Some(view) = app.view_of_mut(&target) {
        view.adjust_key_width(&target.level, &key, delta);
    }
    refresh_cursors(app);
    vec![]
}

fn adjust_view_width(app: &mut AppState, delta: i64) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    if let Some(view) = app.view_of_mut(&target) {
        view.adjust_width(delta);
    }
    refresh_cursors(app);
    vec![]
}

fn copy_focused(app: &mut AppState) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let format = app.config.copy_format;
    let snapshot = app.snapshot.value();

    let text = match &target.key {
        Some(key) => {
            let level_value = resolve(snapshot, &target.level).value();
            app.view_of(&target)
                .and_then(|view| view.level(&target.level))
                .zip(level_value)
                .and_then(|(level, value)| level.copy_text(key, value, format))
        }
        None => resolve(snapshot, &target.view)
            .value()
            .map(|value| format_copy(value, format)),
    };
    copy_or_toast(app, text)
}

fn copy_view(app: &mut AppState) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let text = resolve(app.snapshot.value(), &target.view)
        .value()
        .map(|value| format_copy(value, app.config.copy_format));
    copy_or_toast(app, text)
}

fn copy_or_toast(app: &mut AppState, text: Option<String>) -> Vec<UiEffect> {
    match text {
        Some(text) => vec![UiEffect::CopyToClipboard { text }],
        None => {
            app.show_toast("Nothing to copy: path is absent");
            vec![]
        }
    }
}

fn favorite_focused(app: &mut AppState) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };
    let Some(key) = target.key.as_ref() else {
        app.show_toast("Select a key to favorite");
        return vec![];
    };

    let added = app
        .view_of(&target)
        .and_then(|view| view.favorite(&target.level, key));
    app.sync_panels();
    if let Some(path) = added {
        app.show_toast(format!("★ {}", path.label()));
    }
    refresh_cursors(app);
    vec![]
}

fn unfavorite_focused(app: &mut AppState) -> Vec<UiEffect> {
    let Some(target) = app.focused().cloned() else {
        return vec![];
    };

    match app.pane {
        Pane::Favorites => {
            if let Some(view) = app.view_of(&target) {
                view.unfavorite();
            }
        }
        Pane::Main => {
            let path = target.path();
            if app.favorites.borrow().contains(&path) {
                app.global.emit(FAVORITE_DELETE, &path);
            } else {
                app.show_toast(format!("{} is not a favorite", path.label()));
                return vec![];
            }
        }
    }
    app.sync_panels();
    refresh_cursors(app);
    vec![]
}

fn switch_pane(app: &mut AppState) {
    app.pane = match app.pane {
        Pane::Main if app.favorites_visible() => Pane::Favorites,
        _ => Pane::Main,
    };
    refresh_cursors(app);
}

// ============================================================================
// Focus & Scrolling
// ============================================================================

fn page(app: &AppState) -> isize {
    let height = app.areas().inner(app.pane).height;
    height.saturating_sub(1).max(1) as isize
}

/// Moves focus `delta` targets along the pane's focus order.
fn move_focus(app: &mut AppState, delta: isize) {
    let pane = app.pane;
    let layout = app.layout(pane);
    if layout.targets.is_empty() {
        return;
    }

    let cursor = app.cursor(pane);
    let current = cursor
        .target
        .as_ref()
        .and_then(|target| layout.position(target))
        .unwrap_or(cursor.index);
    let last = layout.targets.len() - 1;
    let next = current.saturating_add_signed(delta).min(last);

    let placed = &layout.targets[next];
    let height = usize::from(app.areas().inner(pane).height).max(1);
    let cursor = app.cursor_mut(pane);
    cursor.index = next;
    cursor.target = Some(placed.target.clone());
    cursor.scroll_y = scroll_to_show(cursor.scroll_y, placed.line, height);
}

fn scroll_to_show(scroll: usize, line: usize, height: usize) -> usize {
    if line < scroll {
        line
    } else if line >= scroll + height {
        line + 1 - height
    } else {
        scroll
    }
}

/// Scrolls the pane, dragging focus along when it leaves the window.
fn scroll_by(app: &mut AppState, delta: isize) {
    let pane = app.pane;
    let layout = app.layout(pane);
    let height = usize::from(app.areas().inner(pane).height).max(1);
    let cursor = app.cursor_mut(pane);
    cursor.scroll_y = cursor
        .scroll_y
        .saturating_add_signed(delta)
        .min(layout.len().saturating_sub(height));

    let top = cursor.scroll_y;
    let visible = |line: usize| line >= top && line < top + height;
    let focus_visible = cursor
        .target
        .as_ref()
        .and_then(|target| layout.targets.iter().find(|placed| placed.target == *target))
        .is_some_and(|placed| visible(placed.line));
    if !focus_visible
        && let Some((index, placed)) = layout
            .targets
            .iter()
            .enumerate()
            .find(|(_, placed)| visible(placed.line))
    {
        cursor.index = index;
        cursor.target = Some(placed.target.clone());
    }
    refresh_cursors(app);
}

fn scroll_horizontal(app: &mut AppState, delta: isize) {
    let pane = app.pane;
    let width = app.layout(pane).width();
    let cursor = app.cursor_mut(pane);
    cursor.scroll_x = cursor
        .scroll_x
        .saturating_add_signed(delta)
        .min(width.saturating_sub(1));
}

/// Re-anchors both cursors after anything that changes the layout.
///
/// Focus follows its structural target; when the target is gone, the
/// cursor keeps its index clamped to the new focus order.
fn refresh_cursors(app: &mut AppState) {
    for pane in [Pane::Main, Pane::Favorites] {
        if pane == Pane::Favorites && !app.favorites_visible() {
            app.fav_cursor = PaneCursor::default();
            if app.pane == Pane::Favorites {
                app.pane = Pane::Main;
            }
            continue;
        }
        refresh_cursor(app, pane);
    }
}

fn refresh_cursor(app: &mut AppState, pane: Pane) {
    let layout = app.layout(pane);
    let height = usize::from(app.areas().inner(pane).height).max(1);
    let cursor = app.cursor_mut(pane);

    if layout.targets.is_empty() {
        cursor.target = None;
        cursor.index = 0;
        cursor.scroll_y = 0;
        return;
    }

    let found = cursor
        .target
        .as_ref()
        .and_then(|target| layout.position(target));
    let index = found.unwrap_or_else(|| cursor.index.min(layout.targets.len() - 1));
    let placed = &layout.targets[index];
    if found.is_none() {
        cursor.target = Some(placed.target.clone());
    }
    cursor.index = index;
    cursor.scroll_y = scroll_to_show(
        cursor.scroll_y.min(layout.len().saturating_sub(height)),
        placed.line,
        height,
    );
}
