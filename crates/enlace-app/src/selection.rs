// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::NodeKey;

/// The not-yet-grouped column selection. Backed by an insertion-ordered list
/// so the node order of a created connection is deterministic; toggling a
/// key off and back on re-appends it at the end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    keys: Vec<NodeKey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership. Returns true if the key is a member afterwards.
    pub fn toggle(&mut self, key: NodeKey) -> bool {
        if let Some(index) = self.keys.iter().position(|k| *k == key) {
            self.keys.remove(index);
            false
        } else {
            self.keys.push(key);
            true
        }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn ordered(&self) -> &[NodeKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
