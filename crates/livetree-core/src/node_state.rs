//! Per-level node UI state.
//!
//! Every tree level keeps a map from child key to `NodeStateEntry`. Each
//! boolean field is tri-state: `None` means "follow whatever the parent
//! passed down", `Some(_)` is an explicit user override. Toggling always
//! writes the negation of the *effective* value and never changes the
//! inherited default.

use std::collections::HashMap;

use crate::path::Segment;

/// Default display width of a nested level, in percent of its allotment.
pub const DEFAULT_WIDTH_PERCENT: u16 = 100;
/// Upper width bound for nested levels.
pub const NESTED_MAX_WIDTH_PERCENT: u16 = 400;
/// Upper width bound for root and favorite-panel views.
pub const ROOT_MAX_WIDTH_PERCENT: u16 = 4000;

/// Inheritable boolean fields. Also the payload of a reset broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Collapsed,
    Raw,
}

impl StateField {
    pub fn as_str(self) -> &'static str {
        match self {
            StateField::Collapsed => "collapsed",
            StateField::Raw => "raw",
        }
    }
}

/// Override if set, else the inherited default.
pub fn effective(override_value: Option<bool>, inherited: bool) -> bool {
    override_value.unwrap_or(inherited)
}

/// Clamps a width percentage into `DEFAULT_WIDTH_PERCENT..=max`.
pub fn clamp_width(percent: i64, max: u16) -> u16 {
    percent.clamp(i64::from(DEFAULT_WIDTH_PERCENT), i64::from(max)) as u16
}

/// UI state recorded for one key at one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStateEntry {
    pub collapsed: Option<bool>,
    pub raw: Option<bool>,
    pub width_percent: Option<u16>,
}

impl NodeStateEntry {
    pub fn get(&self, field: StateField) -> Option<bool> {
        match field {
            StateField::Collapsed => self.collapsed,
            StateField::Raw => self.raw,
        }
    }

    pub fn set(&mut self, field: StateField, value: Option<bool>) {
        match field {
            StateField::Collapsed => self.collapsed = value,
            StateField::Raw => self.raw = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_none() && self.raw.is_none() && self.width_percent.is_none()
    }
}

/// Key → entry map owned by a single tree level.
#[derive(Debug, Clone, Default)]
pub struct LevelState {
    entries: HashMap<Segment, NodeStateEntry>,
}

impl LevelState {
    pub fn override_of(&self, key: &Segment, field: StateField) -> Option<bool> {
        self.entries.get(key).and_then(|entry| entry.get(field))
    }

    pub fn effective(&self, key: &Segment, field: StateField, inherited: bool) -> bool {
        effective(self.override_of(key, field), inherited)
    }

    pub fn set_override(&mut self, key: &Segment, field: StateField, value: bool) {
        self.entries
            .entry(key.clone())
            .or_default()
            .set(field, Some(value));
    }

    /// Flips the effective value of `field` for `key` and returns the new value.
    pub fn toggle(&mut self, key: &Segment, field: StateField, inherited: bool) -> bool {
        let next = !self.effective(key, field, inherited);
        self.set_override(key, field, next);
        next
    }

    pub fn width(&self, key: &Segment) -> u16 {
        self.entries
            .get(key)
            .and_then(|entry| entry.width_percent)
            .unwrap_or(DEFAULT_WIDTH_PERCENT)
    }

    /// Stores a width clamped to `100..=max` and returns the stored value.
    pub fn set_width(&mut self, key: &Segment, percent: i64, max: u16) -> u16 {
        let width = clamp_width(percent, max);
        self.entries.entry(key.clone()).or_default().width_percent = Some(width);
        width
    }

    pub fn adjust_width(&mut self, key: &Segment, delta: i64, max: u16) -> u16 {
        let current = i64::from(self.width(key));
        self.set_width(key, current + delta, max)
    }

    /// Drops every override of `field` at this level.
    pub fn clear(&mut self, field: StateField) {
        for entry in self.entries.values_mut() {
            entry.set(field, None);
        }
        self.entries.retain(|_, entry| !entry.is_empty());
    }

    /// Forgets entries for keys that no longer exist at this level.
    pub fn retain_keys<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Segment) -> bool,
    {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
