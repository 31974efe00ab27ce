//! Ordered favorites registry.
//!
//! Entries are paths, not values. The newest favorite sits at the front.
//! Resolution against the current snapshot happens at render time, and an
//! absent result leaves the entry in place.

use crate::path::NodePath;

#[derive(Debug, Clone, Default)]
pub struct FavoritesRegistry {
    entries: Vec<NodePath>,
}

impl FavoritesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `path` to the front, inserting it if needed.
    ///
    /// Returns true if the visible order changed.
    pub fn add(&mut self, path: NodePath) -> bool {
        match self.entries.iter().position(|entry| *entry == path) {
            Some(0) => false,
            Some(index) => {
                let existing = self.entries.remove(index);
                self.entries.insert(0, existing);
                true
            }
            None => {
                self.entries.insert(0, path);
                true
            }
        }
    }

    /// Removes `path` if present. Returns true if something was removed.
    pub fn remove(&mut self, path: &NodePath) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != path);
        self.entries.len() != before
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.entries.contains(path)
    }

    pub fn list_in_order(&self) -> &[NodePath] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodePath> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
