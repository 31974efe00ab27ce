//! Retained tree model.
//!
//! A `TreeView` is one independently rooted tree: the main view, or one
//! favorite panel. It owns a subtree bus and a root `TreeLevel`. Each level
//! owns the UI state of its own keys and the child levels of its expanded
//! container keys, and holds a `reset` subscription on the view's bus for as
//! long as it exists.
//!
//! Levels are reconciled against the value they display whenever the
//! snapshot is replaced or their own state changes. Reconciliation keeps
//! child levels whose key still holds an expanded container and drops the
//! rest, which drops their subscriptions with them.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::bus::{EventBus, FAVORITE_ADD, FAVORITE_DELETE, RESET, Subscription};
use crate::node_state::{
    DEFAULT_WIDTH_PERCENT, LevelState, NESTED_MAX_WIDTH_PERCENT, ROOT_MAX_WIDTH_PERCENT,
    StateField, clamp_width,
};
use crate::path::{NodePath, Resolved, Segment, resolve};
use crate::snapshot::{CopyFormat, format_copy, is_container, own_entries};

/// Bus scoped to one tree view. Carries reset broadcasts.
pub type SubtreeBus = EventBus<StateField>;

/// Bus shared by the whole viewer. Carries favorite add/delete paths.
pub type GlobalBus = EventBus<NodePath>;

/// Defaults a level receives from its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inherited {
    pub collapsed: bool,
    pub raw: bool,
}

impl Inherited {
    pub fn get(self, field: StateField) -> bool {
        match field {
            StateField::Collapsed => self.collapsed,
            StateField::Raw => self.raw,
        }
    }

    fn flip(&mut self, field: StateField) -> bool {
        let slot = match field {
            StateField::Collapsed => &mut self.collapsed,
            StateField::Raw => &mut self.raw,
        };
        *slot = !*slot;
        *slot
    }
}

/// One recursion level of a tree view.
pub struct TreeLevel {
    path: NodePath,
    inherited: Inherited,
    stacked: bool,
    state: Rc<RefCell<LevelState>>,
    bus: SubtreeBus,
    global: GlobalBus,
    children: HashMap<Segment, TreeLevel>,
    _reset: Subscription,
}

impl fmt::Debug for TreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeLevel")
            .field("path", &self.path.label())
            .field("inherited", &self.inherited)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl TreeLevel {
    /// Creates an empty level and subscribes it to `reset` on `bus`.
    ///
    /// Call `reconcile` to populate it.
    pub fn new(
        path: NodePath,
        inherited: Inherited,
        stacked: bool,
        bus: SubtreeBus,
        global: GlobalBus,
    ) -> Self {
        let state = Rc::new(RefCell::new(LevelState::default()));
        let listener_state = Rc::clone(&state);
        let reset = bus.subscribe(RESET, move |field| {
            listener_state.borrow_mut().clear(*field);
        });

        Self {
            path,
            inherited,
            stacked,
            state,
            bus,
            global,
            children: HashMap::new(),
            _reset: reset,
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn inherited(&self) -> Inherited {
        self.inherited
    }

    pub fn stacked(&self) -> bool {
        self.stacked
    }

    pub fn state(&self) -> Ref<'_, LevelState> {
        self.state.borrow()
    }

    pub fn effective(&self, key: &Segment, field: StateField) -> bool {
        self.state
            .borrow()
            .effective(key, field, self.inherited.get(field))
    }

    pub fn width(&self, key: &Segment) -> u16 {
        self.state.borrow().width(key)
    }

    pub fn child(&self, key: &Segment) -> Option<&TreeLevel> {
        self.children.get(key)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of levels in this subtree, this one included.
    ///
    /// Each level holds exactly one reset subscription.
    pub fn level_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(TreeLevel::level_count)
            .sum::<usize>()
    }

    /// Finds the descendant at `relative` segments below this level.
    pub fn level(&self, relative: &[Segment]) -> Option<&TreeLevel> {
        match relative.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(head)?.level(rest),
        }
    }

    pub fn level_mut(&mut self, relative: &[Segment]) -> Option<&mut TreeLevel> {
        match relative.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get_mut(head)?.level_mut(rest),
        }
    }

    /// Brings this level in line with `value`.
    pub fn reconcile(&mut self, value: &Value, inherited: Inherited) {
        self.inherited = inherited;
        let entries = own_entries(value);

        {
            let present: HashSet<&Segment> = entries.iter().map(|(key, _)| key).collect();
            self.state
                .borrow_mut()
                .retain_keys(|key| present.contains(key));
        }

        let mut previous = std::mem::take(&mut self.children);
        for (key, child_value) in entries {
            if !is_container(child_value) {
                continue;
            }
            let (collapsed, raw) = {
                let state = self.state.borrow();
                (
                    state.effective(&key, StateField::Collapsed, inherited.collapsed),
                    state.effective(&key, StateField::Raw, inherited.raw),
                )
            };
            if collapsed || raw {
                continue;
            }

            let child_inherited = Inherited {
                collapsed: inherited.collapsed,
                raw,
            };
            let mut child = previous.remove(&key).unwrap_or_else(|| {
                TreeLevel::new(
                    self.path.append(key.clone()),
                    child_inherited,
                    self.stacked,
                    self.bus.clone(),
                    self.global.clone(),
                )
            });
            child.reconcile(child_value, child_inherited);
            self.children.insert(key, child);
        }

        if !previous.is_empty() {
            debug!(
                level = %self.path.label(),
                dropped = previous.len(),
                "dropped child levels"
            );
        }
    }

    /// Flips `field` for `key` and reconciles this level against `value`.
    ///
    /// Returns the new effective value.
    pub fn toggle(&mut self, key: &Segment, field: StateField, value: &Value) -> bool {
        let next = self
            .state
            .borrow_mut()
            .toggle(key, field, self.inherited.get(field));
        self.reconcile(value, self.inherited);
        next
    }

    pub fn toggle_collapsed(&mut self, key: &Segment, value: &Value) -> bool {
        self.toggle(key, StateField::Collapsed, value)
    }

    pub fn toggle_raw(&mut self, key: &Segment, value: &Value) -> bool {
        self.toggle(key, StateField::Raw, value)
    }

    /// Changes the display width of `key` by `delta` percent points.
    pub fn adjust_width(&mut self, key: &Segment, delta: i64) -> u16 {
        self.state
            .borrow_mut()
            .adjust_width(key, delta, NESTED_MAX_WIDTH_PERCENT)
    }

    /// Text of `key`'s subtree in `format`, or `None` if `key` is not in `value`.
    pub fn copy_text(&self, key: &Segment, value: &Value, format: CopyFormat) -> Option<String> {
        let path = NodePath::root().append(key.clone());
        resolve(value, &path)
            .value()
            .map(|child| format_copy(child, format))
    }

    /// Announces `key`'s path on the global bus as a new favorite.
    pub fn favorite(&self, key: &Segment) -> NodePath {
        let path = self.path.append(key.clone());
        self.global.emit(FAVORITE_ADD, &path);
        path
    }
}

/// An independently rooted tree with its own subtree bus.
pub struct TreeView {
    base: NodePath,
    bus: SubtreeBus,
    global: GlobalBus,
    defaults: Inherited,
    width_percent: u16,
    present: bool,
    root: TreeLevel,
}

impl fmt::Debug for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("base", &self.base.label())
            .field("defaults", &self.defaults)
            .field("width_percent", &self.width_percent)
            .field("present", &self.present)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl TreeView {
    /// Creates a view rooted at `base` with a fresh subtree bus.
    pub fn new(base: NodePath, defaults: Inherited, stacked: bool, global: GlobalBus) -> Self {
        let bus = SubtreeBus::new();
        let root = TreeLevel::new(base.clone(), defaults, stacked, bus.clone(), global.clone());
        Self {
            base,
            bus,
            global,
            defaults,
            width_percent: DEFAULT_WIDTH_PERCENT,
            present: false,
            root,
        }
    }

    pub fn base(&self) -> &NodePath {
        &self.base
    }

    pub fn bus(&self) -> &SubtreeBus {
        &self.bus
    }

    pub fn defaults(&self) -> Inherited {
        self.defaults
    }

    pub fn width_percent(&self) -> u16 {
        self.width_percent
    }

    pub fn stacked(&self) -> bool {
        self.root.stacked()
    }

    /// Whether the base path resolved at the last `sync`.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn root(&self) -> &TreeLevel {
        &self.root
    }

    /// Value this view displays in `snapshot`.
    pub fn resolve<'a>(&self, snapshot: &'a Value) -> Resolved<'a> {
        resolve(snapshot, &self.base)
    }

    /// Reconciles the whole view against `snapshot`.
    ///
    /// An absent base path leaves the view empty; it fills again as soon as
    /// the path resolves.
    pub fn sync(&mut self, snapshot: &Value) -> bool {
        match resolve(snapshot, &self.base) {
            Resolved::Found(value) => {
                self.root.reconcile(value, self.defaults);
                self.present = true;
            }
            Resolved::Absent => {
                self.root.reconcile(&Value::Null, self.defaults);
                self.present = false;
            }
        }
        self.present
    }

    /// Broadcasts a reset of `field` to every level of this view only.
    pub fn reset(&mut self, field: StateField, snapshot: &Value) -> usize {
        let reached = self.bus.emit(RESET, &field);
        debug!(view = %self.base.label(), field = field.as_str(), reached, "reset");
        self.sync(snapshot);
        reached
    }

    /// Flips the view-wide default for `field` and clears its overrides.
    pub fn toggle_default(&mut self, field: StateField, snapshot: &Value) -> bool {
        let next = self.defaults.flip(field);
        self.reset(field, snapshot);
        next
    }

    /// Changes the view's own width, bounded by the root maximum.
    pub fn adjust_width(&mut self, delta: i64) -> u16 {
        self.width_percent = clamp_width(
            i64::from(self.width_percent) + delta,
            ROOT_MAX_WIDTH_PERCENT,
        );
        self.width_percent
    }

    pub fn level(&self, path: &NodePath) -> Option<&TreeLevel> {
        self.root.level(path.strip_prefix(&self.base)?)
    }

    pub fn level_mut(&mut self, path: &NodePath) -> Option<&mut TreeLevel> {
        self.root.level_mut(path.strip_prefix(&self.base)?)
    }

    /// Flips `field` of `key` at the level found at `level_path`.
    ///
    /// Returns `None` if that level is not currently materialized.
    pub fn toggle(
        &mut self,
        level_path: &NodePath,
        key: &Segment,
        field: StateField,
        snapshot: &Value,
    ) -> Option<bool> {
        let value = resolve(snapshot, level_path).value()?;
        let level = self.level_mut(level_path)?;
        Some(level.toggle(key, field, value))
    }

    pub fn adjust_key_width(
        &mut self,
        level_path: &NodePath,
        key: &Segment,
        delta: i64,
    ) -> Option<u16> {
        Some(self.level_mut(level_path)?.adjust_width(key, delta))
    }

    pub fn favorite(&self, level_path: &NodePath, key: &Segment) -> Option<NodePath> {
        Some(self.level(level_path)?.favorite(key))
    }

    /// Announces removal of this view's base path from the favorites.
    pub fn unfavorite(&self) {
        self.global.emit(FAVORITE_DELETE, &self.base);
    }

    /// Number of reset subscriptions currently held by this view's levels.
    pub fn level_count(&self) -> usize {
        self.root.level_count()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::favorites::FavoritesRegistry;

    fn key(name: &str) -> Segment {
        Segment::from(name)
    }

    fn view(data: &Value) -> TreeView {
        let mut view = TreeView::new(
            NodePath::root(),
            Inherited::default(),
            true,
            GlobalBus::new(),
        );
        view.sync(data);
        view
    }

    #[test]
    fn test_children_follow_expanded_containers() {
        let data = json!({"a": {"x": {"y": 1}}, "b": [1, 2], "c": 3});
        let view = view(&data);

        assert!(view.root().child(&key("a")).is_some());
        assert!(view.root().child(&key("b")).is_some());
        assert!(view.root().child(&key("c")).is_none());
        assert_eq!(view.level_count(), 4);
        assert_eq!(view.bus().listener_count(RESET), 4);

        let x = view
            .level(&NodePath::root().append("a").append("x"))
            .unwrap();
        assert_eq!(x.path().to_string(), "['a']['x']");
    }

    #[test]
    fn test_vanished_keys_drop_levels_and_subscriptions() {
        let mut view = view(&json!({"a": {"x": {}}, "b": {}}));
        assert_eq!(view.bus().listener_count(RESET), 4);

        view.sync(&json!({"b": {}}));
        assert_eq!(view.level_count(), 2);
        assert_eq!(view.bus().listener_count(RESET), 2);

        view.sync(&json!({"b": 5}));
        assert_eq!(view.bus().listener_count(RESET), 1);
    }

    #[test]
    fn test_collapsing_drops_child_and_expanding_restores_it() {
        let data = json!({"a": {"b": {}}});
        let mut view = view(&data);
        let root = NodePath::root();

        assert_eq!(
            view.toggle(&root, &key("a"), StateField::Collapsed, &data),
            Some(true)
        );
        assert!(view.root().child(&key("a")).is_none());
        assert_eq!(view.bus().listener_count(RESET), 1);

        assert_eq!(
            view.toggle(&root, &key("a"), StateField::Collapsed, &data),
            Some(false)
        );
        assert_eq!(view.level_count(), 3);
    }

    #[test]
    fn test_level_controls_double_toggle_is_identity() {
        let data = json!({"a": {"b": {}}, "c": [1]});
        let mut view = view(&data);
        let root = view.level_mut(&NodePath::root()).unwrap();
        assert_eq!(root.child_count(), 2);

        assert!(root.toggle_raw(&key("c"), &data));
        assert_eq!(root.child_count(), 1);
        assert!(!root.toggle_raw(&key("c"), &data));

        assert!(root.toggle_collapsed(&key("a"), &data));
        assert!(!root.toggle_collapsed(&key("a"), &data));
        assert_eq!(root.child_count(), 2);
        assert!(!root.effective(&key("a"), StateField::Collapsed));
        assert!(!root.effective(&key("c"), StateField::Raw));
    }

    #[test]
    fn test_unset_override_equals_inherited_default() {
        let data = json!({"a": {"b": {"c": 1}}});
        let mut view = view(&data);
        let a = NodePath::root().append("a");

        let level = view.level(&a).unwrap();
        assert!(!level.effective(&key("b"), StateField::Collapsed));
        assert!(!level.effective(&key("b"), StateField::Raw));

        view.toggle_default(StateField::Collapsed, &data);
        assert!(view.root().effective(&key("a"), StateField::Collapsed));
        // Collapsed hides the child level entirely.
        assert!(view.level(&a).is_none());
    }

    #[test]
    fn test_override_survives_default_flip_until_reset() {
        let data = json!({"a": {"b": 1}, "z": {"q": 2}});
        let mut view = view(&data);
        let root = NodePath::root();

        view.toggle(&root, &key("a"), StateField::Collapsed, &data);
        view.toggle(&root, &key("a"), StateField::Collapsed, &data);
        // Explicit "expanded" override on `a`.
        assert_eq!(
            view.root().state().override_of(&key("a"), StateField::Collapsed),
            Some(false)
        );

        view.defaults.flip(StateField::Collapsed);
        view.sync(&data);
        assert!(!view.root().effective(&key("a"), StateField::Collapsed));
        assert!(view.root().effective(&key("z"), StateField::Collapsed));

        view.reset(StateField::Collapsed, &data);
        assert!(view.root().effective(&key("a"), StateField::Collapsed));
    }

    #[test]
    fn test_reset_clears_every_depth_on_its_own_bus_only() {
        let data = json!({"a": {"b": {"c": 1}, "d": 2}});
        let global = GlobalBus::new();
        let mut main = TreeView::new(NodePath::root(), Inherited::default(), true, global.clone());
        let mut panel = TreeView::new(NodePath::root(), Inherited::default(), true, global);
        main.sync(&data);
        panel.sync(&data);

        let a = NodePath::root().append("a");
        for view in [&mut main, &mut panel] {
            view.toggle(&a, &key("d"), StateField::Raw, &data);
            view.toggle(&a, &key("b"), StateField::Raw, &data);
        }

        // `b` is raw, so only the root and `a` are subscribed.
        let reached = main.reset(StateField::Raw, &data);
        assert_eq!(reached, 2);

        let main_a = main.level(&a).unwrap();
        assert_eq!(main_a.state().override_of(&key("b"), StateField::Raw), None);
        assert_eq!(main_a.state().override_of(&key("d"), StateField::Raw), None);
        assert!(main.level(&a.append("b")).is_some());

        let panel_a = panel.level(&a).unwrap();
        assert_eq!(
            panel_a.state().override_of(&key("b"), StateField::Raw),
            Some(true)
        );
        assert!(panel.level(&a.append("b")).is_none());
    }

    #[test]
    fn test_state_of_vanished_key_is_forgotten() {
        let mut view = view(&json!({"a": {}, "b": {}}));
        let root = NodePath::root();
        view.toggle(&root, &key("a"), StateField::Collapsed, &json!({"a": {}, "b": {}}));

        view.sync(&json!({"b": {}}));
        view.sync(&json!({"a": {}, "b": {}}));

        assert!(!view.root().effective(&key("a"), StateField::Collapsed));
        assert!(view.root().child(&key("a")).is_some());
    }

    #[test]
    fn test_width_bounds_differ_between_nested_and_view() {
        let data = json!({"a": {"b": {}}});
        let mut view = view(&data);

        assert_eq!(
            view.adjust_key_width(&NodePath::root(), &key("a"), 1000),
            Some(NESTED_MAX_WIDTH_PERCENT)
        );
        assert_eq!(view.adjust_width(10_000), ROOT_MAX_WIDTH_PERCENT);
        assert_eq!(view.adjust_width(-100_000), DEFAULT_WIDTH_PERCENT);
    }

    #[test]
    fn test_copy_text_of_key() {
        let data = json!({"a": {"b": [1]}});
        let view = view(&data);
        let text = view
            .root()
            .copy_text(&key("a"), &data, CopyFormat::Json)
            .unwrap();
        assert_eq!(text, "{\n  \"b\": [\n    1\n  ]\n}");
        assert!(
            view.root()
                .copy_text(&key("zz"), &data, CopyFormat::Json)
                .is_none()
        );
    }

    #[test]
    fn test_favorite_scenario_survives_shape_change() {
        let global = GlobalBus::new();
        let registry = Rc::new(RefCell::new(FavoritesRegistry::new()));
        let sink = Rc::clone(&registry);
        let _add = global.subscribe(FAVORITE_ADD, move |path| {
            sink.borrow_mut().add(path.clone());
        });
        let sink = Rc::clone(&registry);
        let _delete = global.subscribe(FAVORITE_DELETE, move |path| {
            sink.borrow_mut().remove(path);
        });

        let first = json!({"a": {"b": 1, "c": [2, 3]}});
        let mut main = TreeView::new(NodePath::root(), Inherited::default(), true, global.clone());
        main.sync(&first);

        let c = NodePath::root().append("a").append("c");
        let favorite = main.favorite(&c, &Segment::Index(1)).unwrap();
        assert_eq!(favorite.to_string(), "['a']['c'][1]");
        assert_eq!(registry.borrow().list_in_order(), &[favorite.clone()]);

        let mut panel = TreeView::new(favorite.clone(), Inherited::default(), true, global);
        assert!(panel.sync(&first));
        assert_eq!(panel.resolve(&first).value(), Some(&json!(3)));

        let second = json!({"a": {"b": 1}});
        main.sync(&second);
        assert!(!panel.sync(&second));
        assert!(panel.resolve(&second).is_absent());
        assert_eq!(registry.borrow().len(), 1);
        assert!(main.level(&c).is_none());

        panel.unfavorite();
        assert!(registry.borrow().is_empty());
    }
}
