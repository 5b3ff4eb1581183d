// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::{NodeKey, TableId};

/// Connector colors cycle through this palette; serial 1 maps to the first
/// entry.
pub const PALETTE: [&str; 10] = [
    "#e74c3c", "#8e44ad", "#3498db", "#16a085", "#f1c40f", "#d35400", "#2c3e50", "#7f8c8d",
    "#c0392b", "#2980b9",
];

pub const fn color_for(serial: u32) -> &'static str {
    PALETTE[(serial as usize - 1) % PALETTE.len()]
}

/// A parsed table before registration, as produced by the ingestion side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A loaded table. Immutable once registered; the connection logic only
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub loaded_at: OffsetDateTime,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn header(&self, column: usize) -> Option<&str> {
        self.headers.get(column).map(String::as_str)
    }
}

/// Owns the loaded tables and hands out sequential ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
    next_id: i64,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: TableSource) -> TableId {
        self.next_id += 1;
        let id = TableId::new(self.next_id);
        self.tables.push(Table {
            id,
            name: source.name,
            headers: source.headers,
            rows: source.rows,
            loaded_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn get(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|table| table.id == id)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolves a node key to display data. A key pointing at a table or
    /// column that cannot be found degrades to `"Unknown"` rather than
    /// failing.
    pub fn resolve(&self, key: NodeKey) -> NodeRef {
        let table = self.get(key.table);
        let table_name = table.map_or_else(|| "Unknown".to_owned(), |t| t.name.clone());
        let header_name = table
            .and_then(|t| t.header(key.column))
            .map_or_else(|| "Unknown".to_owned(), str::to_owned);
        NodeRef {
            key,
            table_name,
            header_name,
        }
    }
}

/// A member of a connection: the node key plus display data captured at
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub key: NodeKey,
    pub table_name: String,
    pub header_name: String,
}

impl NodeRef {
    pub fn display_label(&self) -> String {
        format!("{}({})", self.table_name, self.header_name)
    }
}
