// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::connections::ConnectionStore;
use crate::ids::{ConnectionId, NodeKey, TableId};
use crate::log::{ActivityLog, DEFAULT_LOG_CAPACITY};
use crate::menu::ContextMenu;
use crate::model::{TableRegistry, TableSource};
use crate::selection::SelectionSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceOptions {
    pub log_capacity: usize,
    pub max_tables: Option<usize>,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            max_tables: None,
        }
    }
}

/// Discrete input gestures, after the host UI has resolved what was hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCommand {
    LoadTable(TableSource),
    IngestFailed { name: String, message: String },
    ClickNode(NodeKey),
    OpenNodeMenu { node: NodeKey, x: u16, y: u16 },
    Group,
    DeleteSelected,
    Cancel,
    ClickBackground,
    ClickConnection(ConnectionId),
    MenuSetStart,
    MenuSetEnd,
    MenuAddInstruction,
    InstructionEntered {
        connection: ConnectionId,
        text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    TableLoaded(TableId),
    TableRejected,
    SelectionChanged(NodeKey),
    MenuOpened(ConnectionId),
    MenuClosed,
    ConnectionCreated(ConnectionId),
    ConnectionDeleted(ConnectionId),
    ConnectionSelected(ConnectionId),
    SelectionCleared,
    StartNodeSet(ConnectionId),
    EndNodeSet(ConnectionId),
    /// The host should collect one line of text and answer with
    /// `InstructionEntered` for this connection.
    PromptRequested(ConnectionId),
    InstructionsUpdated(ConnectionId),
}

/// The orchestrator: owns every piece of mutable session state and is the
/// only place that mutates it. Hosts feed commands in, render from the read
/// accessors, and react to the returned events.
#[derive(Debug, Default)]
pub struct Workspace {
    registry: TableRegistry,
    selection: SelectionSet,
    store: ConnectionStore,
    menu: ContextMenu,
    selected_connection: Option<ConnectionId>,
    pending_instruction: Option<ConnectionId>,
    log: ActivityLog,
    max_tables: Option<usize>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_options(WorkspaceOptions::default())
    }

    pub fn with_options(options: WorkspaceOptions) -> Self {
        Self {
            log: ActivityLog::with_capacity(options.log_capacity),
            max_tables: options.max_tables,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: WorkspaceCommand) -> Vec<WorkspaceEvent> {
        match command {
            WorkspaceCommand::LoadTable(source) => self.load_table(source),
            WorkspaceCommand::IngestFailed { name, message } => {
                self.log.push(format!("Error parsing {name}: {message}"));
                vec![WorkspaceEvent::TableRejected]
            }
            WorkspaceCommand::ClickNode(key) => self.click_node(key),
            WorkspaceCommand::OpenNodeMenu { node, x, y } => self.open_node_menu(node, x, y),
            WorkspaceCommand::Group => self.group_selection(),
            WorkspaceCommand::DeleteSelected => self.delete_selected(),
            WorkspaceCommand::Cancel => self.cancel(),
            WorkspaceCommand::ClickBackground => self.click_background(),
            WorkspaceCommand::ClickConnection(id) => {
                self.selected_connection = Some(id);
                self.log.push(format!("Selected Connection: {id}"));
                vec![WorkspaceEvent::ConnectionSelected(id)]
            }
            WorkspaceCommand::MenuSetStart => self.menu_set_start(),
            WorkspaceCommand::MenuSetEnd => self.menu_set_end(),
            WorkspaceCommand::MenuAddInstruction => self.menu_add_instruction(),
            WorkspaceCommand::InstructionEntered { connection, text } => {
                self.instruction_entered(connection, text)
            }
        }
    }

    fn load_table(&mut self, source: TableSource) -> Vec<WorkspaceEvent> {
        if let Some(max) = self.max_tables
            && self.registry.len() >= max
        {
            self.log.push(format!(
                "Rejected {}: table limit of {max} reached",
                source.name
            ));
            return vec![WorkspaceEvent::TableRejected];
        }

        let name = source.name.clone();
        let columns = source.headers.len();
        let id = self.registry.register(source);
        self.log.push(format!("Loaded {name} with {columns} columns."));
        vec![WorkspaceEvent::TableLoaded(id)]
    }

    fn click_node(&mut self, key: NodeKey) -> Vec<WorkspaceEvent> {
        let mut events = Vec::new();
        if self.menu.visible {
            self.menu.close();
            events.push(WorkspaceEvent::MenuClosed);
        }
        self.selection.toggle(key);
        events.push(WorkspaceEvent::SelectionChanged(key));
        events
    }

    fn open_node_menu(&mut self, node: NodeKey, x: u16, y: u16) -> Vec<WorkspaceEvent> {
        // Only nodes that already belong to a connection get a menu.
        let Some(connection) = self.store.find_by_node(node).map(|c| c.id) else {
            return Vec::new();
        };
        self.menu.open(x, y, connection, node);
        vec![WorkspaceEvent::MenuOpened(connection)]
    }

    fn group_selection(&mut self) -> Vec<WorkspaceEvent> {
        if self.selection.len() < 2 {
            return Vec::new();
        }

        let keys = self.selection.ordered().to_vec();
        let Some(connection) = self.store.create(&keys, &self.registry) else {
            return Vec::new();
        };
        let id = connection.id;
        let summary = connection.node_summary();
        self.selection.clear();
        self.log
            .push(format!("Group Created: {id} linking [{summary}]"));
        vec![WorkspaceEvent::ConnectionCreated(id)]
    }

    fn delete_selected(&mut self) -> Vec<WorkspaceEvent> {
        let Some(id) = self.selected_connection else {
            return Vec::new();
        };
        self.selected_connection = None;
        if !self.store.delete(id) {
            // Nothing matched; deliberately no log entry for a no-op delete.
            return vec![WorkspaceEvent::SelectionCleared];
        }
        self.log.push(format!("Deleted Connection: {id}"));
        vec![
            WorkspaceEvent::ConnectionDeleted(id),
            WorkspaceEvent::SelectionCleared,
        ]
    }

    fn cancel(&mut self) -> Vec<WorkspaceEvent> {
        if !self.menu.visible {
            return Vec::new();
        }
        self.menu.close();
        vec![WorkspaceEvent::MenuClosed]
    }

    fn click_background(&mut self) -> Vec<WorkspaceEvent> {
        let mut events = Vec::new();
        if self.menu.visible {
            self.menu.close();
            events.push(WorkspaceEvent::MenuClosed);
        }
        if self.selected_connection.take().is_some() {
            events.push(WorkspaceEvent::SelectionCleared);
        }
        events
    }

    fn menu_set_start(&mut self) -> Vec<WorkspaceEvent> {
        let Some((connection, node)) = self.menu.binding() else {
            return Vec::new();
        };
        self.menu.close();
        if !self.store.set_start(connection, node) {
            return vec![WorkspaceEvent::MenuClosed];
        }
        self.log
            .push(format!("Connection {connection}: Start Node set."));
        vec![
            WorkspaceEvent::StartNodeSet(connection),
            WorkspaceEvent::MenuClosed,
        ]
    }

    fn menu_set_end(&mut self) -> Vec<WorkspaceEvent> {
        let Some((connection, node)) = self.menu.binding() else {
            return Vec::new();
        };
        self.menu.close();
        if !self.store.set_end(connection, node) {
            return vec![WorkspaceEvent::MenuClosed];
        }
        self.log
            .push(format!("Connection {connection}: End Node set."));
        vec![
            WorkspaceEvent::EndNodeSet(connection),
            WorkspaceEvent::MenuClosed,
        ]
    }

    fn menu_add_instruction(&mut self) -> Vec<WorkspaceEvent> {
        let Some((connection, _)) = self.menu.binding() else {
            return Vec::new();
        };
        self.menu.close();
        if self.pending_instruction.is_some() {
            // An outstanding prompt holds exclusive intent on the
            // instructions field; don't open a second one.
            return vec![WorkspaceEvent::MenuClosed];
        }
        self.pending_instruction = Some(connection);
        vec![
            WorkspaceEvent::PromptRequested(connection),
            WorkspaceEvent::MenuClosed,
        ]
    }

    fn instruction_entered(
        &mut self,
        connection: ConnectionId,
        text: Option<String>,
    ) -> Vec<WorkspaceEvent> {
        if self.pending_instruction != Some(connection) {
            return Vec::new();
        }
        self.pending_instruction = None;

        // Cancelled prompt: leave the field untouched.
        let Some(text) = text else {
            return Vec::new();
        };
        // The connection may have been deleted while the prompt was open;
        // the write is dropped rather than resurrecting it.
        if !self.store.set_instructions(connection, text) {
            return Vec::new();
        }
        self.log
            .push(format!("Connection {connection}: Instruction updated."));
        vec![WorkspaceEvent::InstructionsUpdated(connection)]
    }

    // Read snapshots for the rendering side.

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn connections(&self) -> &ConnectionStore {
        &self.store
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn selected_connection(&self) -> Option<ConnectionId> {
        self.selected_connection
    }

    pub fn pending_instruction(&self) -> Option<ConnectionId> {
        self.pending_instruction
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }
}
