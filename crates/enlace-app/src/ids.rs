// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(TableId);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Identity of a connection. The wrapped value is the 1-based creation
/// serial; serials grow monotonically and are never reused, even after the
/// connection is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u32);

impl ConnectionId {
    pub const fn new(serial: u32) -> Self {
        Self(serial)
    }

    pub const fn serial(self) -> u32 {
        self.0
    }

    pub fn label(self) -> String {
        format!("C{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// One column of one loaded table. A structured pair rather than a
/// `"<tableId>-<column>"` string so identity never depends on delimiter
/// parsing; the dashed form survives only as the `Display` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub table: TableId,
    pub column: usize,
}

impl NodeKey {
    pub const fn new(table: TableId, column: usize) -> Self {
        Self { table, column }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.table, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionId, NodeKey, TableId};

    #[test]
    fn connection_label_uses_serial() {
        assert_eq!(ConnectionId::new(1).label(), "C1");
        assert_eq!(ConnectionId::new(42).to_string(), "C42");
    }

    #[test]
    fn node_key_identity_is_structural() {
        let a = NodeKey::new(TableId::new(1), 0);
        let b = NodeKey::new(TableId::new(1), 0);
        let c = NodeKey::new(TableId::new(2), 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "T1-0");
    }
}
