// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

use crate::ids::{ConnectionId, NodeKey};
use crate::model::{NodeRef, TableRegistry, color_for};

/// A user-defined grouping of two or more column nodes. Nodes keep the order
/// the columns were selected in; start/end are optional designations within
/// that set and are not validated against membership. The palette color is a
/// static hex string, so only serialization is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub color: &'static str,
    pub nodes: Vec<NodeRef>,
    pub instructions: String,
    pub start_node: Option<NodeKey>,
    pub end_node: Option<NodeKey>,
}

impl Connection {
    pub fn contains_node(&self, key: NodeKey) -> bool {
        self.nodes.iter().any(|node| node.key == key)
    }

    /// Comma-joined `table(header)` labels, used for the creation log entry.
    pub fn node_summary(&self) -> String {
        self.nodes
            .iter()
            .map(NodeRef::display_label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Owns the connection list and the creation counter. The counter only
/// advances on successful creation and never rewinds on deletion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    counter: u32,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connection from the given keys, resolving display data
    /// through the registry. Fewer than two keys is a silent no-op that
    /// leaves the counter untouched.
    pub fn create(&mut self, keys: &[NodeKey], registry: &TableRegistry) -> Option<&Connection> {
        if keys.len() < 2 {
            return None;
        }

        self.counter += 1;
        let id = ConnectionId::new(self.counter);
        let nodes = keys.iter().map(|key| registry.resolve(*key)).collect();
        self.connections.push(Connection {
            id,
            color: color_for(self.counter),
            nodes,
            instructions: String::new(),
            start_node: None,
            end_node: None,
        });
        self.connections.last()
    }

    /// Removes the matching connection. Returns whether a removal happened;
    /// an absent id is a no-op, not an error.
    pub fn delete(&mut self, id: ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|connection| connection.id != id);
        self.connections.len() < before
    }

    pub fn set_start(&mut self, id: ConnectionId, key: NodeKey) -> bool {
        self.get_mut(id).is_some_and(|connection| {
            connection.start_node = Some(key);
            true
        })
    }

    pub fn set_end(&mut self, id: ConnectionId, key: NodeKey) -> bool {
        self.get_mut(id).is_some_and(|connection| {
            connection.end_node = Some(key);
            true
        })
    }

    pub fn set_instructions(&mut self, id: ConnectionId, text: String) -> bool {
        self.get_mut(id).is_some_and(|connection| {
            connection.instructions = text;
            true
        })
    }

    /// First connection (in store order) containing the key. A key is
    /// expected to belong to at most one connection, but that is not
    /// enforced.
    pub fn find_by_node(&self, key: NodeKey) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|connection| connection.contains_node(key))
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections
            .iter_mut()
            .find(|connection| connection.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
