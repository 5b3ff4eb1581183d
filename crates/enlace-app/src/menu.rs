// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::{ConnectionId, NodeKey};

/// Transient state of the per-node context menu. A closed menu may keep the
/// fields of its last binding; they are only meaningful while visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextMenu {
    pub visible: bool,
    pub x: u16,
    pub y: u16,
    pub connection: Option<ConnectionId>,
    pub node: Option<NodeKey>,
}

impl ContextMenu {
    pub fn open(&mut self, x: u16, y: u16, connection: ConnectionId, node: NodeKey) {
        self.visible = true;
        self.x = x;
        self.y = y;
        self.connection = Some(connection);
        self.node = Some(node);
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    /// The bound connection and node, if the menu is currently open.
    pub fn binding(&self) -> Option<(ConnectionId, NodeKey)> {
        if !self.visible {
            return None;
        }
        self.connection.zip(self.node)
    }
}
