// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic fixtures shared by the enlace crates' tests.

use anyhow::{Context, Result, anyhow};
use enlace_app::{
    ConnectionId, NodeKey, TableId, TableSource, Workspace, WorkspaceCommand, WorkspaceEvent,
};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn table_source(name: &str, headers: &[&str], rows: &[&[&str]]) -> TableSource {
    TableSource {
        name: name.to_owned(),
        headers: headers.iter().map(|h| (*h).to_owned()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|cell| (*cell).to_owned()).collect())
            .collect(),
    }
}

/// The two-table scenario used across the suite: orders.csv(id, name) and
/// refs.csv(id, ref), with one sample row each.
pub fn orders_source() -> TableSource {
    table_source("orders.csv", &["id", "name"], &[&["1", "alice"]])
}

pub fn refs_source() -> TableSource {
    table_source("refs.csv", &["id", "ref"], &[&["1", "ORD-1"]])
}

/// A workspace with orders.csv and refs.csv loaded; their first columns are
/// `node(1, 0)` and `node(2, 0)`.
pub fn workspace_with_tables() -> Workspace {
    let mut workspace = Workspace::new();
    workspace.dispatch(WorkspaceCommand::LoadTable(orders_source()));
    workspace.dispatch(WorkspaceCommand::LoadTable(refs_source()));
    workspace
}

pub fn node(table: i64, column: usize) -> NodeKey {
    NodeKey::new(TableId::new(table), column)
}

/// Selects the two id columns and groups them, returning the new
/// connection's id.
pub fn group_id_columns(workspace: &mut Workspace) -> Result<ConnectionId> {
    workspace.dispatch(WorkspaceCommand::ClickNode(node(1, 0)));
    workspace.dispatch(WorkspaceCommand::ClickNode(node(2, 0)));
    let events = workspace.dispatch(WorkspaceCommand::Group);
    events
        .iter()
        .find_map(|event| match event {
            WorkspaceEvent::ConnectionCreated(id) => Some(*id),
            _ => None,
        })
        .ok_or_else(|| anyhow!("grouping did not create a connection: {events:?}"))
}

/// A temp directory pre-populated with CSV fixture files.
pub struct CsvFixture {
    dir: TempDir,
}

impl CsvFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create fixture directory")?,
        })
    }

    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).with_context(|| format!("write fixture {name}"))?;
        Ok(path)
    }

    pub fn orders_csv(&self) -> Result<PathBuf> {
        self.write("orders.csv", "id,name\n1,alice\n2,bob\n3,carol\n")
    }

    pub fn refs_csv(&self) -> Result<PathBuf> {
        self.write("refs.csv", "id,ref\n1,ORD-1\n")
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::{CsvFixture, group_id_columns, workspace_with_tables};
    use anyhow::Result;

    #[test]
    fn canned_workspace_groups_the_id_columns() -> Result<()> {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace)?;
        assert_eq!(id.serial(), 1);
        assert_eq!(workspace.connections().len(), 1);
        Ok(())
    }

    #[test]
    fn fixture_files_land_in_the_temp_dir() -> Result<()> {
        let fixture = CsvFixture::new()?;
        let path = fixture.orders_csv()?;
        assert!(path.starts_with(fixture.path()));
        assert!(std::fs::read_to_string(path)?.starts_with("id,name"));
        Ok(())
    }
}
