//! Application state.
//!
//! ```text
//! AppState
//! ├── snapshot: Snapshot            (last good feed value)
//! ├── main: TreeView                (own subtree bus)
//! ├── panels: Vec<TreeView>         (one per favorite, registry order)
//! ├── favorites: Rc<RefCell<FavoritesRegistry>>
//! ├── global: GlobalBus             (favorite-add / favorite-delete)
//! ├── main_cursor / fav_cursor      (focus + scroll per pane)
//! └── poll: PollStats               (connectivity for the status line)
//! ```
//!
//! Everything here lives on the UI thread. The favorites registry is only
//! mutated by the two global-bus listeners installed in `AppState::new`;
//! panels are rebuilt from it by `sync_panels`.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use std::time::{Duration, Instant};

use livetree_core::bus::{FAVORITE_ADD, FAVORITE_DELETE, Subscription};
use livetree_core::config::Config;
use livetree_core::favorites::FavoritesRegistry;
use livetree_core::feed::PollSchedule;
use livetree_core::path::NodePath;
use livetree_core::snapshot::Snapshot;
use livetree_core::tree::{GlobalBus, Inherited, TreeView};
use tracing::info;

use crate::features::statusline::PollStats;
use crate::features::tree::{
    FocusTarget, LayoutContext, TreeLayout, ViewKind, layout_favorites, layout_view,
};
use crate::render::{PaneAreas, pane_areas};

/// How long a toast stays on the status line.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Main,
    Favorites,
}

/// Focus and scroll position of one pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneCursor {
    /// Structural focus; survives snapshots that move the row around.
    pub target: Option<FocusTarget>,
    /// Index into the layout's focus order, used when the target vanishes.
    pub index: usize,
    pub scroll_y: usize,
    pub scroll_x: usize,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub created: Instant,
}

impl Toast {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created.elapsed() >= TOAST_DURATION
    }
}

pub struct AppState {
    pub config: Config,
    pub snapshot: Snapshot,
    /// Human-facing address of the feed host.
    pub address: String,
    pub global: GlobalBus,
    pub favorites: Rc<RefCell<FavoritesRegistry>>,
    pub main: TreeView,
    pub panels: Vec<TreeView>,
    pub pane: Pane,
    pub main_cursor: PaneCursor,
    pub fav_cursor: PaneCursor,
    /// Keeps the favorites pane open regardless of scroll.
    pub pinned: bool,
    pub toast: Option<Toast>,
    pub poll: PollStats,
    pub schedule: PollSchedule,
    pub viewport: (u16, u16),
    pub should_quit: bool,
    _favorite_subs: [Subscription; 2],
}

impl AppState {
    /// Creates the state shown before the first poll settles.
    ///
    /// `address` is the initial host label, usually the feed origin.
    pub fn new(config: Config, address: String) -> Self {
        let global = GlobalBus::new();
        let favorites = Rc::new(RefCell::new(FavoritesRegistry::new()));

        let on_add = {
            let favorites = Rc::clone(&favorites);
            global.subscribe(FAVORITE_ADD, move |path: &NodePath| {
                if favorites.borrow_mut().add(path.clone()) {
                    info!(path = %path.label(), "favorite added");
                }
            })
        };
        let on_delete = {
            let favorites = Rc::clone(&favorites);
            global.subscribe(FAVORITE_DELETE, move |path: &NodePath| {
                if favorites.borrow_mut().remove(path) {
                    info!(path = %path.label(), "favorite removed");
                }
            })
        };

        let snapshot = Snapshot::placeholder();
        let mut main = TreeView::new(
            NodePath::root(),
            Self::defaults_from(&config),
            config.layout.is_stacked(),
            global.clone(),
        );
        main.sync(snapshot.value());

        Self {
            schedule: PollSchedule::from_config(&config),
            config,
            snapshot,
            address,
            global,
            favorites,
            main,
            panels: Vec::new(),
            pane: Pane::Main,
            main_cursor: PaneCursor::default(),
            fav_cursor: PaneCursor::default(),
            pinned: false,
            toast: None,
            poll: PollStats::new(),
            viewport: (80, 24),
            should_quit: false,
            _favorite_subs: [on_add, on_delete],
        }
    }

    fn defaults_from(config: &Config) -> Inherited {
        Inherited {
            collapsed: config.collapsed,
            raw: config.raw,
        }
    }

    /// Replaces the snapshot and reconciles every view against it.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.main.sync(self.snapshot.value());
        self.sync_panels();
    }

    /// Makes `panels` mirror the registry: same order, existing panels
    /// reused so their node state survives.
    pub fn sync_panels(&mut self) {
        let order: Vec<NodePath> = self.favorites.borrow().iter().cloned().collect();
        let mut previous = mem::take(&mut self.panels);

        for base in order {
            let mut panel = match previous.iter().position(|panel| *panel.base() == base) {
                Some(index) => previous.swap_remove(index),
                None => TreeView::new(
                    base,
                    Self::defaults_from(&self.config),
                    self.config.layout.is_stacked(),
                    self.global.clone(),
                ),
            };
            panel.sync(self.snapshot.value());
            self.panels.push(panel);
        }

        if self.panels.is_empty() && self.pane == Pane::Favorites {
            self.pane = Pane::Main;
        }
    }

    /// Whether the docked favorites pane is on screen.
    pub fn favorites_visible(&self) -> bool {
        if self.favorites.borrow().is_empty() {
            return false;
        }
        let dock_after = usize::from(self.config.favorites_dock_after);
        if self.pinned || self.main_cursor.scroll_y >= dock_after {
            return true;
        }
        // A main pane that cannot scroll as far as the threshold docks right away.
        let (width, height) = self.viewport;
        let undocked = pane_areas(width, height, false).main;
        let main_lines = self.unfocused_main_layout(undocked.width).len();
        main_lines.saturating_sub(usize::from(undocked.height)) < dock_after
    }

    fn unfocused_main_layout(&self, width: u16) -> TreeLayout {
        let favorites = self.favorites.borrow();
        let ctx = LayoutContext {
            snapshot: self.snapshot.value(),
            favorites: &favorites,
            focused: None,
        };
        layout_view(&self.main, ViewKind::Main, &ctx, usize::from(width))
    }

    pub fn areas(&self) -> PaneAreas {
        let (width, height) = self.viewport;
        pane_areas(width, height, self.favorites_visible())
    }

    pub fn cursor(&self, pane: Pane) -> &PaneCursor {
        match pane {
            Pane::Main => &self.main_cursor,
            Pane::Favorites => &self.fav_cursor,
        }
    }

    pub fn cursor_mut(&mut self, pane: Pane) -> &mut PaneCursor {
        match pane {
            Pane::Main => &mut self.main_cursor,
            Pane::Favorites => &mut self.fav_cursor,
        }
    }

    /// Lays out `pane` with its current focus highlighted.
    pub fn layout(&self, pane: Pane) -> TreeLayout {
        let favorites = self.favorites.borrow();
        let ctx = LayoutContext {
            snapshot: self.snapshot.value(),
            favorites: &favorites,
            focused: if pane == self.pane {
                self.cursor(pane).target.as_ref()
            } else {
                None
            },
        };
        let areas = self.areas();
        match pane {
            Pane::Main => layout_view(
                &self.main,
                ViewKind::Main,
                &ctx,
                usize::from(areas.main.width),
            ),
            Pane::Favorites => layout_favorites(
                &self.panels,
                &ctx,
                usize::from(areas.favorites.map_or(0, |area| area.width)),
            ),
        }
    }

    /// The view a focus target belongs to.
    pub fn view_of(&self, target: &FocusTarget) -> Option<&TreeView> {
        match self.pane {
            Pane::Main => Some(&self.main),
            Pane::Favorites => self.panels.iter().find(|panel| *panel.base() == target.view),
        }
    }

    pub fn view_of_mut(&mut self, target: &FocusTarget) -> Option<&mut TreeView> {
        match self.pane {
            Pane::Main => Some(&mut self.main),
            Pane::Favorites => self
                .panels
                .iter_mut()
                .find(|panel| *panel.base() == target.view),
        }
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.cursor(self.pane).target.as_ref()
    }

    pub fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast::new(text));
    }
}

#[cfg(test)]
mod tests {
    use livetree_core::config::Layout;
    use serde_json::json;

    use super::*;

    fn state() -> AppState {
        AppState::new(Config::default(), "http://127.0.0.1:8080".to_string())
    }

    #[test]
    fn test_starts_with_placeholder() {
        let app = state();
        assert_eq!(app.snapshot.value(), &json!([{ "status": null }]));
        assert!(app.main.is_present());
        assert!(!app.favorites_visible());
    }

    #[test]
    fn test_global_bus_drives_panels() {
        let mut app = state();
        app.apply_snapshot(Snapshot::new(json!({ "a": { "b": 1 }, "c": 2 })));

        let a = NodePath::root().append("a");
        let c = NodePath::root().append("c");
        app.global.emit(FAVORITE_ADD, &a);
        app.global.emit(FAVORITE_ADD, &c);
        app.sync_panels();

        let bases: Vec<String> = app.panels.iter().map(|p| p.base().to_string()).collect();
        assert_eq!(bases, vec![c.to_string(), a.to_string()]);
        assert!(app.favorites_visible());

        app.global.emit(FAVORITE_DELETE, &c);
        app.sync_panels();
        assert_eq!(app.panels.len(), 1);
        assert_eq!(*app.panels[0].base(), a);
    }

    #[test]
    fn test_panel_survives_absent_path() {
        let mut app = state();
        app.apply_snapshot(Snapshot::new(json!({ "a": { "b": 1 } })));
        app.global.emit(FAVORITE_ADD, &NodePath::root().append("a"));
        app.sync_panels();
        assert!(app.panels[0].is_present());

        app.apply_snapshot(Snapshot::new(json!({ "a": 5 })));
        assert_eq!(app.panels.len(), 1);
        assert!(app.panels[0].is_present());

        app.apply_snapshot(Snapshot::new(json!({ "z": 1 })));
        assert_eq!(app.panels.len(), 1);
        assert!(!app.panels[0].is_present());
    }

    #[test]
    fn test_dock_threshold() {
        let config = Config {
            favorites_dock_after: 5,
            ..Config::default()
        };
        let mut app = AppState::new(config, String::new());
        let long: serde_json::Map<String, serde_json::Value> =
            (0..40).map(|i| (format!("k{i:02}"), json!(i))).collect();
        app.apply_snapshot(Snapshot::new(serde_json::Value::Object(long)));
        app.global.emit(FAVORITE_ADD, &NodePath::root().append("k00"));
        app.sync_panels();

        assert!(!app.favorites_visible());
        app.main_cursor.scroll_y = 5;
        assert!(app.favorites_visible());
        app.main_cursor.scroll_y = 0;
        app.pinned = true;
        assert!(app.favorites_visible());
    }

    #[test]
    fn test_short_main_docks_without_scrolling() {
        let config = Config {
            layout: Layout::Columns,
            favorites_dock_after: 3,
            ..Config::default()
        };
        let mut app = AppState::new(config, String::new());
        app.viewport = (20, 10);
        app.apply_snapshot(Snapshot::new(json!({ "a": 1, "b": 2 })));
        app.global.emit(FAVORITE_ADD, &NodePath::root().append("a"));
        app.sync_panels();

        assert_eq!(app.main_cursor.scroll_y, 0);
        assert!(app.favorites_visible());
        assert!(app.areas().favorites.is_some());
    }
}
