// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use enlace_app::{
    Connection, ConnectionId, NodeKey, TableSource, Workspace, WorkspaceCommand, WorkspaceEvent,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const MENU_ITEMS: [&str; 3] = ["Set as Start Node", "Set as End Node", "Add Instructions..."];
const NODE_MARK_FREE: &str = "○";
const NODE_MARK_LINKED: &str = "●";
const NODE_MARK_PICKED: &str = "✓";
const START_MARK: &str = "S";
const END_MARK: &str = "E";

/// Seam to the ingestion side: the TUI asks the host to turn a path into a
/// table and feeds the outcome back into the workspace as a command.
pub trait AppRuntime {
    fn load_table(&mut self, path: &Path) -> Result<TableSource>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct NodeCursor {
    table: usize,
    column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptUiState {
    connection: ConnectionId,
    input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct OpenFileUiState {
    visible: bool,
    input: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    cursor: NodeCursor,
    menu_cursor: usize,
    prompt: Option<PromptUiState>,
    open_file: OpenFileUiState,
    help_visible: bool,
    show_markers: bool,
    status_line: Option<String>,
    status_token: u64,
    // Hit boxes rebuilt on every frame, consulted by mouse handling.
    node_hits: Vec<(Rect, NodeKey)>,
    connection_hits: Vec<(Rect, ConnectionId)>,
    menu_hits: Vec<(Rect, usize)>,
    workspace_area: Rect,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            cursor: NodeCursor::default(),
            menu_cursor: 0,
            prompt: None,
            open_file: OpenFileUiState::default(),
            help_visible: false,
            show_markers: true,
            status_line: None,
            status_token: 0,
            node_hits: Vec::new(),
            connection_hits: Vec::new(),
            menu_hits: Vec::new(),
            workspace_area: Rect::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub show_markers: bool,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self { show_markers: true }
    }
}

pub fn run_app<R: AppRuntime>(workspace: &mut Workspace, runtime: &mut R) -> Result<()> {
    run_app_with_options(workspace, runtime, TuiOptions::default())
}

pub fn run_app_with_options<R: AppRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        show_markers: options.show_markers,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(&mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, workspace, &mut view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(workspace, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse_event(workspace, &mut view_data, &internal_tx, mouse);
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Reacts to workspace events that need a UI-side response.
fn apply_events(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[WorkspaceEvent],
) {
    for event in events {
        match event {
            WorkspaceEvent::PromptRequested(id) => {
                view_data.prompt = Some(PromptUiState {
                    connection: *id,
                    input: String::new(),
                });
            }
            WorkspaceEvent::MenuOpened(_) => {
                view_data.menu_cursor = 0;
            }
            WorkspaceEvent::ConnectionCreated(id) => {
                emit_status(view_data, internal_tx, format!("grouped into {id}"));
            }
            WorkspaceEvent::ConnectionDeleted(id) => {
                emit_status(view_data, internal_tx, format!("deleted {id}"));
            }
            WorkspaceEvent::TableRejected => {
                emit_status(view_data, internal_tx, "load failed; see log");
            }
            _ => {}
        }
    }
}

fn dispatch(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: WorkspaceCommand,
) {
    let events = workspace.dispatch(command);
    apply_events(view_data, internal_tx, &events);
}

/// Returns true when the app should quit.
fn handle_key_event<R: AppRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(workspace, view_data, internal_tx, key);
        return false;
    }

    if view_data.open_file.visible {
        handle_open_file_key(workspace, runtime, view_data, internal_tx, key);
        return false;
    }

    if workspace.menu().visible {
        handle_menu_key(workspace, view_data, internal_tx, key);
        return false;
    }

    handle_nav_key(workspace, view_data, internal_tx, key);
    false
}

fn handle_nav_key(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
            move_cursor_column(workspace, view_data, -1);
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            move_cursor_column(workspace, view_data, 1);
        }
        (KeyCode::Left, _) => {
            move_cursor_table(workspace, view_data, -1);
        }
        (KeyCode::Right, _) | (KeyCode::Tab, _) => {
            move_cursor_table(workspace, view_data, 1);
        }
        (KeyCode::Char(' '), _) => {
            if let Some(node) = cursor_node(workspace, view_data) {
                dispatch(workspace, view_data, internal_tx, WorkspaceCommand::ClickNode(node));
            }
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            if workspace.selection().len() < 2 {
                emit_status(view_data, internal_tx, "select at least two nodes to group");
            } else {
                dispatch(workspace, view_data, internal_tx, WorkspaceCommand::Group);
            }
        }
        (KeyCode::Char('d'), KeyModifiers::NONE)
        | (KeyCode::Delete, _)
        | (KeyCode::Backspace, _) => {
            dispatch(
                workspace,
                view_data,
                internal_tx,
                WorkspaceCommand::DeleteSelected,
            );
        }
        (KeyCode::Char('m'), KeyModifiers::NONE) => {
            if let Some(node) = cursor_node(workspace, view_data) {
                let (x, y) = node_screen_position(view_data, node);
                dispatch(
                    workspace,
                    view_data,
                    internal_tx,
                    WorkspaceCommand::OpenNodeMenu { node, x, y },
                );
            }
        }
        (KeyCode::Char(']'), _) => {
            cycle_connection(workspace, view_data, internal_tx, 1);
        }
        (KeyCode::Char('['), _) => {
            cycle_connection(workspace, view_data, internal_tx, -1);
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) => {
            view_data.show_markers = !view_data.show_markers;
            let status = if view_data.show_markers {
                "connector markers shown"
            } else {
                "connector markers hidden"
            };
            emit_status(view_data, internal_tx, status);
        }
        (KeyCode::Char('o'), KeyModifiers::NONE) => {
            view_data.open_file.visible = true;
            view_data.open_file.input.clear();
        }
        (KeyCode::Esc, _) => {
            dispatch(
                workspace,
                view_data,
                internal_tx,
                WorkspaceCommand::ClickBackground,
            );
        }
        _ => {}
    }
}

fn handle_menu_key(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            dispatch(workspace, view_data, internal_tx, WorkspaceCommand::Cancel);
        }
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
            view_data.menu_cursor = view_data.menu_cursor.saturating_sub(1);
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
            view_data.menu_cursor = (view_data.menu_cursor + 1).min(MENU_ITEMS.len() - 1);
        }
        (KeyCode::Enter, _) => {
            run_menu_item(workspace, view_data, internal_tx, view_data.menu_cursor);
        }
        _ => {}
    }
}

fn run_menu_item(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let command = match index {
        0 => WorkspaceCommand::MenuSetStart,
        1 => WorkspaceCommand::MenuSetEnd,
        _ => WorkspaceCommand::MenuAddInstruction,
    };
    dispatch(workspace, view_data, internal_tx, command);
}

fn handle_prompt_key(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.prompt.as_mut() else {
        return;
    };
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            let connection = prompt.connection;
            view_data.prompt = None;
            dispatch(
                workspace,
                view_data,
                internal_tx,
                WorkspaceCommand::InstructionEntered {
                    connection,
                    text: None,
                },
            );
        }
        (KeyCode::Enter, _) => {
            let connection = prompt.connection;
            let text = prompt.input.clone();
            view_data.prompt = None;
            dispatch(
                workspace,
                view_data,
                internal_tx,
                WorkspaceCommand::InstructionEntered {
                    connection,
                    text: Some(text),
                },
            );
        }
        (KeyCode::Backspace, _) => {
            prompt.input.pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.clear();
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            prompt.input.push(ch);
        }
        _ => {}
    }
}

fn handle_open_file_key<R: AppRuntime>(
    workspace: &mut Workspace,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.open_file = OpenFileUiState::default();
        }
        (KeyCode::Enter, _) => {
            let raw = view_data.open_file.input.trim().to_owned();
            view_data.open_file = OpenFileUiState::default();
            if raw.is_empty() {
                return;
            }
            let path = Path::new(&raw);
            let command = match runtime.load_table(path) {
                Ok(source) => WorkspaceCommand::LoadTable(source),
                Err(error) => WorkspaceCommand::IngestFailed {
                    name: display_file_name(path),
                    message: format!("{error:#}"),
                },
            };
            dispatch(workspace, view_data, internal_tx, command);
        }
        (KeyCode::Backspace, _) => {
            view_data.open_file.input.pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.open_file.input.clear();
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            view_data.open_file.input.push(ch);
        }
        _ => {}
    }
}

fn handle_mouse_event(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    // Modal overlays own the keyboard; clicks pass through to them only
    // for the context menu, which has real hit targets.
    if view_data.prompt.is_some() || view_data.open_file.visible || view_data.help_visible {
        return;
    }

    let position = Position::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if workspace.menu().visible
                && let Some(index) = hit_test(&view_data.menu_hits, position)
            {
                run_menu_item(workspace, view_data, internal_tx, index);
                return;
            }
            if let Some(node) = hit_test(&view_data.node_hits, position) {
                dispatch(workspace, view_data, internal_tx, WorkspaceCommand::ClickNode(node));
                move_cursor_to(workspace, view_data, node);
            } else if let Some(id) = hit_test(&view_data.connection_hits, position) {
                dispatch(
                    workspace,
                    view_data,
                    internal_tx,
                    WorkspaceCommand::ClickConnection(id),
                );
            } else if view_data.workspace_area.contains(position) {
                dispatch(
                    workspace,
                    view_data,
                    internal_tx,
                    WorkspaceCommand::ClickBackground,
                );
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some(node) = hit_test(&view_data.node_hits, position) {
                dispatch(
                    workspace,
                    view_data,
                    internal_tx,
                    WorkspaceCommand::OpenNodeMenu {
                        node,
                        x: mouse.column,
                        y: mouse.row,
                    },
                );
                move_cursor_to(workspace, view_data, node);
            }
        }
        _ => {}
    }
}

fn hit_test<T: Copy>(hits: &[(Rect, T)], position: Position) -> Option<T> {
    hits.iter()
        .find(|(rect, _)| rect.contains(position))
        .map(|(_, value)| *value)
}

fn cursor_node(workspace: &Workspace, view_data: &ViewData) -> Option<NodeKey> {
    let table = workspace.registry().tables().get(view_data.cursor.table)?;
    if table.column_count() == 0 {
        return None;
    }
    let column = view_data.cursor.column.min(table.column_count() - 1);
    Some(NodeKey::new(table.id, column))
}

fn move_cursor_column(workspace: &Workspace, view_data: &mut ViewData, delta: isize) {
    let Some(table) = workspace.registry().tables().get(view_data.cursor.table) else {
        return;
    };
    if table.column_count() == 0 {
        return;
    }
    let max = (table.column_count() - 1) as isize;
    let next = (view_data.cursor.column as isize + delta).clamp(0, max);
    view_data.cursor.column = next as usize;
}

fn move_cursor_table(workspace: &Workspace, view_data: &mut ViewData, delta: isize) {
    let count = workspace.registry().len();
    if count == 0 {
        return;
    }
    let next = (view_data.cursor.table as isize + delta).rem_euclid(count as isize) as usize;
    view_data.cursor.table = next;
    move_cursor_column(workspace, view_data, 0);
}

fn move_cursor_to(workspace: &Workspace, view_data: &mut ViewData, node: NodeKey) {
    if let Some(index) = workspace
        .registry()
        .tables()
        .iter()
        .position(|table| table.id == node.table)
    {
        view_data.cursor.table = index;
        view_data.cursor.column = node.column;
    }
}

fn node_screen_position(view_data: &ViewData, node: NodeKey) -> (u16, u16) {
    view_data
        .node_hits
        .iter()
        .find(|(_, key)| *key == node)
        .map_or((0, 0), |(rect, _)| (rect.x, rect.y))
}

fn cycle_connection(
    workspace: &mut Workspace,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let ids: Vec<ConnectionId> = workspace.connections().iter().map(|c| c.id).collect();
    if ids.is_empty() {
        return;
    }
    let next = match workspace
        .selected_connection()
        .and_then(|id| ids.iter().position(|candidate| *candidate == id))
    {
        Some(current) => {
            (current as isize + delta).rem_euclid(ids.len() as isize) as usize
        }
        None if delta >= 0 => 0,
        None => ids.len() - 1,
    };
    dispatch(
        workspace,
        view_data,
        internal_tx,
        WorkspaceCommand::ClickConnection(ids[next]),
    );
}

fn render(frame: &mut ratatui::Frame<'_>, workspace: &Workspace, view_data: &mut ViewData) {
    view_data.node_hits.clear();
    view_data.connection_hits.clear();
    view_data.menu_hits.clear();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(9),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!(
        "{} tables | {} connections | {} nodes selected",
        workspace.registry().len(),
        workspace.connections().len(),
        workspace.selection().len(),
    ))
    .block(Block::default().title("enlace").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    view_data.workspace_area = layout[1];
    render_tables(frame, layout[1], workspace, view_data);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(layout[2]);
    render_connections(frame, bottom[0], workspace, view_data);
    render_log(frame, bottom[1], workspace);

    let status = Paragraph::new(status_text(workspace, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if workspace.menu().visible {
        render_menu(frame, workspace, view_data);
    }

    if let Some(prompt) = &view_data.prompt {
        let area = centered_rect(60, 24, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(format!(
            "Instruction for {}:\n\n> {}\n\nEnter: save | Esc: cancel",
            prompt.connection, prompt.input
        ))
        .block(Block::default().title("instructions").borders(Borders::ALL));
        frame.render_widget(body, area);
    }

    if view_data.open_file.visible {
        let area = centered_rect(60, 24, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(format!(
            "CSV path:\n\n> {}\n\nEnter: load | Esc: cancel",
            view_data.open_file.input
        ))
        .block(Block::default().title("load table").borders(Borders::ALL));
        frame.render_widget(body, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_tables(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    workspace: &Workspace,
    view_data: &mut ViewData,
) {
    let tables = workspace.registry().tables();
    if tables.is_empty() {
        let empty = Paragraph::new("\nNo tables loaded.\n\nPress o to load a CSV file.")
            .block(Block::default().borders(Borders::ALL).title("workspace"));
        frame.render_widget(empty, area);
        return;
    }

    let share = (100 / tables.len().max(1)) as u16;
    let constraints: Vec<Constraint> = tables
        .iter()
        .map(|_| Constraint::Percentage(share))
        .collect();
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (index, table) in tables.iter().enumerate() {
        let panel = panels[index];
        let is_active = index == view_data.cursor.table;
        let border_style = if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title(format!("{} ({})", table.name, table.id))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let mut lines = Vec::new();
        for (column, header) in table.headers.iter().enumerate() {
            let key = NodeKey::new(table.id, column);
            let at_cursor = is_active && column == view_data.cursor.column;
            lines.push(node_line(workspace, view_data, key, header, at_cursor));

            let row_offset = lines.len() as u16 - 1;
            if row_offset < inner.height {
                view_data
                    .node_hits
                    .push((Rect::new(inner.x, inner.y + row_offset, inner.width, 1), key));
            }
        }

        if !table.rows.is_empty() {
            lines.push(Line::default());
            for row in &table.rows {
                lines.push(Line::styled(
                    row.join(", "),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn node_line<'a>(
    workspace: &Workspace,
    view_data: &ViewData,
    key: NodeKey,
    header: &'a str,
    at_cursor: bool,
) -> Line<'a> {
    let connection = workspace.connections().find_by_node(key);
    let picked = workspace.selection().contains(key);

    let mut spans = Vec::new();
    match connection {
        Some(connection) if view_data.show_markers => {
            spans.push(Span::styled(
                format!("{NODE_MARK_LINKED}{}", connection.id.serial()),
                Style::default().fg(hex_color(connection.color)),
            ));
        }
        _ if picked => {
            spans.push(Span::styled(
                NODE_MARK_PICKED,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        _ => {
            spans.push(Span::styled(
                NODE_MARK_FREE,
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    if let Some(connection) = connection {
        if connection.start_node == Some(key) {
            spans.push(Span::styled(START_MARK, Style::default().fg(Color::Green)));
        }
        if connection.end_node == Some(key) {
            spans.push(Span::styled(END_MARK, Style::default().fg(Color::Red)));
        }
    }

    spans.push(Span::raw(" "));
    let mut header_style = Style::default();
    if picked {
        header_style = header_style.fg(Color::Cyan);
    }
    if at_cursor {
        header_style = header_style.add_modifier(Modifier::REVERSED);
    }
    spans.push(Span::styled(header, header_style));

    Line::from(spans)
}

fn render_connections(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    workspace: &Workspace,
    view_data: &mut ViewData,
) {
    let block = Block::default()
        .title("active connections")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if workspace.connections().is_empty() {
        let empty = Paragraph::new("No connections yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let mut lines = Vec::new();
    for connection in workspace.connections().iter() {
        let selected = workspace.selected_connection() == Some(connection.id);
        let row_offset = lines.len() as u16;
        if row_offset < inner.height {
            view_data.connection_hits.push((
                Rect::new(inner.x, inner.y + row_offset, inner.width, 1),
                connection.id,
            ));
        }
        lines.push(connection_line(connection, selected));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn connection_line(connection: &Connection, selected: bool) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("{NODE_MARK_LINKED} "),
            Style::default().fg(hex_color(connection.color)),
        ),
        Span::styled(
            connection.id.label(),
            if selected {
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            },
        ),
        Span::raw(format!(
            "  {}  start: {} | end: {}",
            connection.node_summary(),
            if connection.start_node.is_some() {
                "set"
            } else {
                "not set"
            },
            if connection.end_node.is_some() {
                "set"
            } else {
                "not set"
            },
        )),
    ];
    if !connection.instructions.is_empty() {
        spans.push(Span::styled(
            format!("  \"{}\"", connection.instructions),
            Style::default().fg(Color::Cyan),
        ));
    }
    Line::from(spans)
}

fn render_log(frame: &mut ratatui::Frame<'_>, area: Rect, workspace: &Workspace) {
    let block = Block::default().title("system log").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line<'_>> = workspace
        .log()
        .entries()
        .iter()
        .take(inner.height as usize)
        .map(|entry| Line::styled(entry.as_str(), Style::default().fg(Color::Green)))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_menu(frame: &mut ratatui::Frame<'_>, workspace: &Workspace, view_data: &mut ViewData) {
    let menu = workspace.menu();
    let width = MENU_ITEMS
        .iter()
        .map(|item| item.len() as u16)
        .max()
        .unwrap_or(0)
        + 4;
    let height = MENU_ITEMS.len() as u16 + 2;
    let frame_area = frame.area();
    let x = menu.x.min(frame_area.width.saturating_sub(width));
    let y = menu.y.min(frame_area.height.saturating_sub(height));
    let area = Rect::new(x, y, width.min(frame_area.width), height.min(frame_area.height));

    frame.render_widget(Clear, area);
    let block = Block::default().title("node").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (index, item) in MENU_ITEMS.iter().enumerate() {
        let style = if index == view_data.menu_cursor {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        if (index as u16) < inner.height {
            view_data
                .menu_hits
                .push((Rect::new(inner.x, inner.y + index as u16, inner.width, 1), index));
        }
        lines.push(Line::styled(*item, style));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn status_text(workspace: &Workspace, view_data: &ViewData) -> String {
    if let Some(status) = &view_data.status_line {
        return status.clone();
    }
    match workspace.selected_connection() {
        Some(id) => format!("Selected: {id} (press d to delete)"),
        None => "Space: toggle node | g: group | m: node menu | o: load CSV | ?: help".to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "enlace keys\n\
     \n\
     arrows / j k   move between columns and tables\n\
     Space          toggle the column under the cursor\n\
     g              group the selected columns into a connection\n\
     [ / ]          select the previous / next connection\n\
     d / Del        delete the selected connection\n\
     m              open the node menu (start / end / instructions)\n\
     l              show or hide connector markers\n\
     o              load a CSV file by path\n\
     Esc            close menu, clear connection selection\n\
     ?              toggle this help\n\
     Ctrl-q         quit\n\
     \n\
     Mouse: left click toggles a column, right click opens the node menu,\n\
     clicking a connection row selects it, clicking empty space deselects."
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn hex_color(hex: &str) -> Color {
    let raw = hex.strip_prefix('#').unwrap_or(hex);
    if raw.len() != 6 {
        return Color::White;
    }
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&raw[range], 16);
    match (parse(0..2), parse(2..4), parse(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, cycle_connection, handle_key_event,
        handle_mouse_event, hex_color, hit_test, status_text,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use enlace_app::{TableSource, Workspace, WorkspaceCommand};
    use enlace_testkit::{group_id_columns, node, workspace_with_tables};
    use ratatui::layout::{Position, Rect};
    use ratatui::style::Color;
    use std::path::Path;
    use std::sync::mpsc::{self, Sender};

    struct FakeRuntime {
        table: Option<TableSource>,
    }

    impl AppRuntime for FakeRuntime {
        fn load_table(&mut self, _path: &Path) -> Result<TableSource> {
            self.table
                .take()
                .ok_or_else(|| anyhow!("no such file"))
        }
    }

    // Status-clear sends from the timer thread go nowhere; that is fine
    // because the send result is ignored.
    fn channel() -> Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn press(
        workspace: &mut Workspace,
        view_data: &mut ViewData,
        runtime: &mut FakeRuntime,
        code: KeyCode,
    ) {
        let tx = channel();
        let quit = handle_key_event(
            workspace,
            runtime,
            view_data,
            &tx,
            KeyEvent::new(code, KeyModifiers::NONE),
        );
        assert!(!quit);
    }

    fn type_text(
        workspace: &mut Workspace,
        view_data: &mut ViewData,
        runtime: &mut FakeRuntime,
        text: &str,
    ) {
        for ch in text.chars() {
            press(workspace, view_data, runtime, KeyCode::Char(ch));
        }
    }

    fn no_runtime() -> FakeRuntime {
        FakeRuntime { table: None }
    }

    #[test]
    fn hex_color_parses_palette_entries() {
        assert_eq!(hex_color("#e74c3c"), Color::Rgb(0xe7, 0x4c, 0x3c));
        assert_eq!(hex_color("#2980b9"), Color::Rgb(0x29, 0x80, 0xb9));
        assert_eq!(hex_color("not-a-color"), Color::White);
        assert_eq!(hex_color("#12345"), Color::White);
    }

    #[test]
    fn hit_test_returns_first_containing_rect() {
        let hits = vec![(Rect::new(0, 0, 10, 1), 'a'), (Rect::new(0, 1, 10, 1), 'b')];
        assert_eq!(hit_test(&hits, Position::new(3, 1)), Some('b'));
        assert_eq!(hit_test(&hits, Position::new(3, 5)), None);
    }

    #[test]
    fn ctrl_q_quits() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let tx = channel();
        let quit = handle_key_event(
            &mut workspace,
            &mut no_runtime(),
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        assert!(quit);
    }

    #[test]
    fn space_toggles_the_node_under_the_cursor() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        assert!(workspace.selection().contains(node(1, 0)));

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        assert!(workspace.selection().is_empty());
    }

    #[test]
    fn cursor_moves_within_and_across_tables() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Down);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        assert!(workspace.selection().contains(node(1, 1)));

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Right);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Up);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        assert!(workspace.selection().contains(node(2, 0)));

        // Wrap around past the last table, back to the first column of t1.
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Right);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        assert!(workspace.selection().contains(node(1, 0)));
    }

    #[test]
    fn group_key_creates_a_connection_from_the_selection() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Right);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('g'));

        assert_eq!(workspace.connections().len(), 1);
        assert!(workspace.selection().is_empty());
        assert!(view_data.status_line.as_deref().unwrap_or("").contains("grouped"));
    }

    #[test]
    fn group_key_with_thin_selection_reports_instead_of_grouping() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char(' '));
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('g'));
        assert!(workspace.connections().is_empty());
        assert!(
            view_data
                .status_line
                .as_deref()
                .unwrap_or("")
                .contains("at least two")
        );
    }

    #[test]
    fn menu_flow_sets_start_node_via_keyboard() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('m'));
        assert!(workspace.menu().visible);

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);
        assert!(!workspace.menu().visible);
        let connection = workspace.connections().get(id).expect("present");
        assert_eq!(connection.start_node, Some(node(1, 0)));
    }

    #[test]
    fn menu_key_on_unconnected_node_is_a_no_op() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('m'));
        assert!(!workspace.menu().visible);
    }

    #[test]
    fn instruction_prompt_opens_types_and_saves() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('m'));
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Down);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Down);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);
        assert!(view_data.prompt.is_some());
        assert_eq!(workspace.pending_instruction(), Some(id));

        type_text(&mut workspace, &mut view_data, &mut runtime, "join on id");
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);

        assert!(view_data.prompt.is_none());
        assert_eq!(
            workspace.connections().get(id).expect("present").instructions,
            "join on id"
        );
    }

    #[test]
    fn instruction_prompt_escape_cancels_without_writing() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('m'));
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Down);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Down);
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);

        type_text(&mut workspace, &mut view_data, &mut runtime, "discard me");
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Esc);

        assert!(view_data.prompt.is_none());
        assert!(workspace.pending_instruction().is_none());
        assert_eq!(
            workspace.connections().get(id).expect("present").instructions,
            ""
        );
    }

    #[test]
    fn open_file_prompt_loads_a_table_through_the_runtime() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = FakeRuntime {
            table: Some(TableSource {
                name: "extra.csv".to_owned(),
                headers: vec!["a".to_owned(), "b".to_owned()],
                rows: Vec::new(),
            }),
        };

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('o'));
        assert!(view_data.open_file.visible);
        type_text(&mut workspace, &mut view_data, &mut runtime, "extra.csv");
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);

        assert!(!view_data.open_file.visible);
        assert_eq!(workspace.registry().len(), 3);
        assert!(workspace.log().entries()[0].contains("Loaded extra.csv"));
    }

    #[test]
    fn open_file_failure_is_logged_not_fatal() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        let mut runtime = no_runtime();

        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Char('o'));
        type_text(&mut workspace, &mut view_data, &mut runtime, "missing.csv");
        press(&mut workspace, &mut view_data, &mut runtime, KeyCode::Enter);

        assert_eq!(workspace.registry().len(), 2);
        assert!(workspace.log().entries()[0].contains("Error parsing missing.csv"));
    }

    #[test]
    fn bracket_keys_cycle_the_selected_connection() {
        let mut workspace = workspace_with_tables();
        let first = group_id_columns(&mut workspace).expect("grouped");
        workspace.dispatch(WorkspaceCommand::ClickNode(node(1, 1)));
        workspace.dispatch(WorkspaceCommand::ClickNode(node(2, 1)));
        workspace.dispatch(WorkspaceCommand::Group);

        let mut view_data = ViewData::default();
        let tx = channel();
        cycle_connection(&mut workspace, &mut view_data, &tx, 1);
        assert_eq!(workspace.selected_connection(), Some(first));

        cycle_connection(&mut workspace, &mut view_data, &tx, 1);
        assert_eq!(
            workspace.selected_connection().map(|id| id.serial()),
            Some(2)
        );

        cycle_connection(&mut workspace, &mut view_data, &tx, 1);
        assert_eq!(workspace.selected_connection(), Some(first));
    }

    #[test]
    fn left_click_on_a_node_hit_box_toggles_it() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        view_data.node_hits.push((Rect::new(1, 4, 12, 1), node(2, 1)));
        view_data.workspace_area = Rect::new(0, 3, 40, 10);

        let tx = channel();
        handle_mouse_event(
            &mut workspace,
            &mut view_data,
            &tx,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 5,
                row: 4,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert!(workspace.selection().contains(node(2, 1)));
        // The cursor follows the click.
        assert_eq!(view_data.cursor.table, 1);
        assert_eq!(view_data.cursor.column, 1);
    }

    #[test]
    fn right_click_opens_the_menu_for_a_connected_node() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        let mut view_data = ViewData::default();
        view_data.node_hits.push((Rect::new(1, 4, 12, 1), node(1, 0)));

        let tx = channel();
        handle_mouse_event(
            &mut workspace,
            &mut view_data,
            &tx,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Right),
                column: 3,
                row: 4,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert!(workspace.menu().visible);
        assert_eq!(workspace.menu().binding().map(|(c, _)| c), Some(id));
    }

    #[test]
    fn background_click_clears_the_selected_connection() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        workspace.dispatch(WorkspaceCommand::ClickConnection(id));
        let mut view_data = ViewData::default();
        view_data.workspace_area = Rect::new(0, 3, 40, 10);

        let tx = channel();
        handle_mouse_event(
            &mut workspace,
            &mut view_data,
            &tx,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 20,
                row: 8,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert!(workspace.selected_connection().is_none());
    }

    #[test]
    fn click_on_a_connection_row_selects_it() {
        let mut workspace = workspace_with_tables();
        let id = group_id_columns(&mut workspace).expect("grouped");
        let mut view_data = ViewData::default();
        view_data
            .connection_hits
            .push((Rect::new(1, 14, 30, 1), id));

        let tx = channel();
        handle_mouse_event(
            &mut workspace,
            &mut view_data,
            &tx,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 10,
                row: 14,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert_eq!(workspace.selected_connection(), Some(id));
        assert!(workspace.log().entries()[0].contains("Selected Connection"));
    }

    #[test]
    fn status_line_prefers_transient_message_then_selection_hint() {
        let mut workspace = workspace_with_tables();
        let mut view_data = ViewData::default();
        assert!(status_text(&workspace, &view_data).contains("g: group"));

        let id = group_id_columns(&mut workspace).expect("grouped");
        workspace.dispatch(WorkspaceCommand::ClickConnection(id));
        assert!(status_text(&workspace, &view_data).contains("Selected: C1"));

        view_data.status_line = Some("grouped into C1".to_owned());
        assert_eq!(status_text(&workspace, &view_data), "grouped into C1");
    }
}
