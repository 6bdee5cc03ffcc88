//! Navigation state machine
//!
//! Owns which screen is active, the selection inside the resource table and
//! the set of expanded groups. Background refreshes only ever call
//! [`NavigationState::reconcile`], which clamps indices that fell off the end
//! of a shorter listing and leaves everything else alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Entry, LifecycleState, ResourceGroup, ResourceId, ResourceRecord, Snapshot};

const PAGE_ROWS: usize = 10;

/// Which resource the log screen is showing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogTarget {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Index,
    ResourceTable,
    LogView(LogTarget),
}

impl Screen {
    pub fn title(&self) -> String {
        match self {
            Screen::Index => "stardock".to_string(),
            Screen::ResourceTable => "Containers".to_string(),
            Screen::LogView(target) => format!("Logs: {}", target.name),
        }
    }
}

/// How the resource screen lets the operator move through groups.
///
/// `Table` moves a single selection over every visible row. `Tree` moves over
/// top-level entries and steps into a group's members with right/left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLayout {
    #[default]
    Table,
    Tree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Resources,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 2] = [MenuItem::Resources, MenuItem::Quit];

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Resources => "List Containers",
            MenuItem::Quit => "Exit",
        }
    }
}

/// Operator input, already decoded from key presses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Left,
    Right,
    Start,
    Stop,
    ToggleRun,
    ToggleFollow,
    Refresh,
    Back,
    ToggleHelp,
    Quit,
}

/// Log viewport movement requested while the log screen is active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scroll {
    Lines(isize),
    PageUp,
    PageDown,
    Top,
    Bottom,
    ToggleFollow,
}

/// Side effects the state machine asks its owner to carry out
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    FetchResources,
    FetchLogs { id: ResourceId },
    OpenLogs(LogTarget),
    CloseLogs,
    ScrollLogs(Scroll),
    Start { id: ResourceId },
    Stop { id: ResourceId },
    Quit,
}

/// Selection for the tree layout: a top-level entry and optionally one of its
/// members. `child` is only ever `Some` while `top` points at an expanded group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub top: usize,
    pub child: Option<usize>,
}

/// One visible line of the resource table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row<'a> {
    Standalone(&'a ResourceRecord),
    Group {
        group: &'a ResourceGroup,
        expanded: bool,
    },
    Member {
        group: &'a ResourceGroup,
        record: &'a ResourceRecord,
    },
}

impl<'a> Row<'a> {
    /// The resource a start/stop/logs action on this row applies to
    pub fn record(&self) -> Option<&'a ResourceRecord> {
        match self {
            Row::Standalone(record) | Row::Member { record, .. } => Some(record),
            Row::Group { .. } => None,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Row::Standalone(record) | Row::Member { record, .. } => record.is_running(),
            Row::Group { group, .. } => group.is_active(),
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Row::Member { .. })
    }
}

/// Flatten a snapshot into visible rows: one per entry, followed by the
/// members of every expanded group.
pub fn flatten_rows<'a>(snapshot: &'a Snapshot, expanded: &BTreeSet<String>) -> Vec<Row<'a>> {
    let mut rows = Vec::with_capacity(snapshot.len());
    for entry in snapshot.entries() {
        match entry {
            Entry::Standalone(record) => rows.push(Row::Standalone(record)),
            Entry::Group(group) => {
                let is_expanded = expanded.contains(&group.name);
                rows.push(Row::Group {
                    group,
                    expanded: is_expanded,
                });
                if is_expanded {
                    rows.extend(group.members.iter().map(|record| Row::Member { group, record }));
                }
            }
        }
    }
    rows
}

#[derive(Clone, Debug, Default)]
pub struct NavigationState {
    screen: Screen,
    layout: TableLayout,
    selected_index: usize,
    cursor: Cursor,
    expanded_groups: BTreeSet<String>,
    menu_index: usize,
    show_help: bool,
}

impl NavigationState {
    pub fn new(layout: TableLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Index into the focused group's members, tree layout only
    pub fn focused_child_index(&self) -> Option<usize> {
        self.cursor.child
    }

    pub fn expanded_groups(&self) -> &BTreeSet<String> {
        &self.expanded_groups
    }

    pub fn is_expanded(&self, group: &str) -> bool {
        self.expanded_groups.contains(group)
    }

    pub fn menu_index(&self) -> usize {
        self.menu_index
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn log_target(&self) -> Option<&LogTarget> {
        match &self.screen {
            Screen::LogView(target) => Some(target),
            _ => None,
        }
    }

    /// Flip a group between expanded and collapsed
    pub fn toggle_group(&mut self, name: &str) {
        if !self.expanded_groups.remove(name) {
            self.expanded_groups.insert(name.to_string());
        }
    }

    /// The row under the selection, if any
    pub fn selected_row<'a>(&self, snapshot: &'a Snapshot) -> Option<Row<'a>> {
        let rows = flatten_rows(snapshot, &self.expanded_groups);
        rows.get(self.selected_index).copied()
    }

    /// Re-clamp the selection against a freshly retained snapshot.
    ///
    /// Only indices that no longer fit are touched; the active screen and the
    /// expanded set are left exactly as the operator had them.
    pub fn reconcile(&mut self, snapshot: &Snapshot) {
        match self.layout {
            TableLayout::Table => {
                let len = flatten_rows(snapshot, &self.expanded_groups).len();
                self.selected_index = clamp_index(self.selected_index, len);
            }
            TableLayout::Tree => {
                self.clamp_cursor(snapshot);
                self.sync_selected(snapshot);
            }
        }
    }

    /// Apply one input and return the side effects it asks for
    pub fn handle(&mut self, input: Input, snapshot: Option<&Snapshot>) -> Vec<Effect> {
        match input {
            Input::Quit => return vec![Effect::Quit],
            Input::ToggleHelp => {
                self.show_help = !self.show_help;
                return Vec::new();
            }
            _ => {}
        }

        match self.screen.clone() {
            Screen::Index => self.handle_index(input),
            Screen::ResourceTable => {
                let empty = Snapshot::default();
                let snapshot = snapshot.unwrap_or(&empty);
                match self.layout {
                    TableLayout::Table => self.handle_table(input, snapshot),
                    TableLayout::Tree => self.handle_tree(input, snapshot),
                }
            }
            Screen::LogView(target) => self.handle_logs(input, target),
        }
    }

    fn handle_index(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Up => {
                self.menu_index = self.menu_index.saturating_sub(1);
                Vec::new()
            }
            Input::Down => {
                self.menu_index = (self.menu_index + 1).min(MenuItem::ALL.len() - 1);
                Vec::new()
            }
            Input::Enter => match MenuItem::ALL[self.menu_index] {
                MenuItem::Resources => {
                    self.set_screen(Screen::ResourceTable);
                    vec![Effect::FetchResources]
                }
                MenuItem::Quit => vec![Effect::Quit],
            },
            Input::Refresh => vec![Effect::FetchResources],
            _ => Vec::new(),
        }
    }

    fn handle_table(&mut self, input: Input, snapshot: &Snapshot) -> Vec<Effect> {
        let rows = flatten_rows(snapshot, &self.expanded_groups);
        let len = rows.len();
        let selected = rows.get(self.selected_index).copied();

        match input {
            Input::Up => self.selected_index = self.selected_index.saturating_sub(1),
            Input::Down => self.selected_index = clamp_index(self.selected_index + 1, len),
            Input::PageUp => self.selected_index = self.selected_index.saturating_sub(PAGE_ROWS),
            Input::PageDown => {
                self.selected_index = clamp_index(self.selected_index + PAGE_ROWS, len)
            }
            Input::Home => self.selected_index = 0,
            Input::End => self.selected_index = len.saturating_sub(1),
            Input::Enter => match selected {
                Some(Row::Group { group, .. }) => {
                    let name = group.name.clone();
                    self.toggle_group(&name);
                    self.reconcile(snapshot);
                }
                Some(row) => {
                    if let Some(record) = row.record() {
                        return self.open_logs(record);
                    }
                }
                None => {}
            },
            Input::Start | Input::Stop | Input::ToggleRun => {
                if let Some(record) = selected.and_then(|row| row.record()) {
                    return run_effect(input, record).into_iter().collect();
                }
            }
            Input::Refresh => return vec![Effect::FetchResources],
            Input::Back => self.set_screen(Screen::Index),
            Input::Left | Input::Right | Input::ToggleFollow => {}
            Input::Quit | Input::ToggleHelp => {}
        }
        Vec::new()
    }

    fn handle_tree(&mut self, input: Input, snapshot: &Snapshot) -> Vec<Effect> {
        self.clamp_cursor(snapshot);
        let entries = snapshot.entries();
        let current = entries.get(self.cursor.top);
        let effects = match input {
            Input::Up => {
                match self.cursor.child {
                    Some(child) => self.cursor.child = Some(child.saturating_sub(1)),
                    None => self.cursor.top = self.cursor.top.saturating_sub(1),
                }
                Vec::new()
            }
            Input::Down => {
                match (self.cursor.child, current.and_then(Entry::as_group)) {
                    (Some(child), Some(group)) => {
                        self.cursor.child = Some(clamp_index(child + 1, group.members.len()))
                    }
                    _ => self.cursor.top = clamp_index(self.cursor.top + 1, entries.len()),
                }
                Vec::new()
            }
            Input::PageUp | Input::Home => {
                self.cursor = Cursor::default();
                Vec::new()
            }
            Input::PageDown | Input::End => {
                self.cursor = Cursor {
                    top: entries.len().saturating_sub(1),
                    child: None,
                };
                Vec::new()
            }
            Input::Right => {
                if let Some(group) = current.and_then(Entry::as_group) {
                    if !group.members.is_empty() {
                        self.expanded_groups.insert(group.name.clone());
                        self.cursor.child = Some(self.cursor.child.unwrap_or(0));
                    }
                }
                Vec::new()
            }
            Input::Left => {
                self.cursor.child = None;
                Vec::new()
            }
            Input::Enter => match (current, self.cursor.child) {
                (Some(Entry::Group(group)), Some(child)) => match group.members.get(child) {
                    Some(member) => self.open_logs(member),
                    None => Vec::new(),
                },
                (Some(Entry::Group(group)), None) => {
                    let name = group.name.clone();
                    self.toggle_group(&name);
                    Vec::new()
                }
                (Some(Entry::Standalone(record)), _) => self.open_logs(record),
                (None, _) => Vec::new(),
            },
            Input::Start | Input::Stop | Input::ToggleRun => {
                let target = match (current, self.cursor.child) {
                    (Some(Entry::Group(group)), Some(child)) => group.members.get(child),
                    (Some(Entry::Standalone(record)), _) => Some(record),
                    _ => None,
                };
                target
                    .and_then(|record| run_effect(input, record))
                    .into_iter()
                    .collect()
            }
            Input::Refresh => vec![Effect::FetchResources],
            Input::Back => {
                self.set_screen(Screen::Index);
                Vec::new()
            }
            Input::ToggleFollow | Input::Quit | Input::ToggleHelp => Vec::new(),
        };

        self.clamp_cursor(snapshot);
        self.sync_selected(snapshot);
        effects
    }

    fn handle_logs(&mut self, input: Input, target: LogTarget) -> Vec<Effect> {
        let scroll = match input {
            Input::Up => Scroll::Lines(-1),
            Input::Down => Scroll::Lines(1),
            Input::PageUp => Scroll::PageUp,
            Input::PageDown => Scroll::PageDown,
            Input::Home => Scroll::Top,
            Input::End => Scroll::Bottom,
            Input::ToggleFollow => Scroll::ToggleFollow,
            Input::Refresh => return vec![Effect::FetchLogs { id: target.id }],
            Input::Back => {
                self.set_screen(Screen::ResourceTable);
                return vec![Effect::CloseLogs];
            }
            _ => return Vec::new(),
        };
        vec![Effect::ScrollLogs(scroll)]
    }

    fn open_logs(&mut self, record: &ResourceRecord) -> Vec<Effect> {
        let target = LogTarget {
            id: record.id.clone(),
            name: record.display_name.clone(),
        };
        self.set_screen(Screen::LogView(target.clone()));
        vec![
            Effect::OpenLogs(target),
            Effect::FetchLogs {
                id: record.id.clone(),
            },
        ]
    }

    fn set_screen(&mut self, screen: Screen) {
        debug!(from = ?self.screen, to = ?screen, "screen transition");
        self.screen = screen;
    }

    fn clamp_cursor(&mut self, snapshot: &Snapshot) {
        let entries = snapshot.entries();
        self.cursor.top = clamp_index(self.cursor.top, entries.len());
        self.cursor.child = match (self.cursor.child, entries.get(self.cursor.top)) {
            (Some(child), Some(Entry::Group(group)))
                if self.expanded_groups.contains(&group.name) && !group.members.is_empty() =>
            {
                Some(clamp_index(child, group.members.len()))
            }
            _ => None,
        };
    }

    /// Mirror the tree cursor into `selected_index` over the flattened rows
    fn sync_selected(&mut self, snapshot: &Snapshot) {
        let mut index = 0;
        for (position, entry) in snapshot.entries().iter().enumerate() {
            if position == self.cursor.top {
                index += self.cursor.child.map(|c| c + 1).unwrap_or(0);
                break;
            }
            index += 1;
            if let Entry::Group(group) = entry {
                if self.expanded_groups.contains(&group.name) {
                    index += group.members.len();
                }
            }
        }
        self.selected_index = index;
    }
}

/// Map start/stop/toggle-run onto a concrete command for `record`.
///
/// Toggle-run only knows how to stop a running resource and start an exited
/// one; every other lifecycle state is left alone.
fn run_effect(input: Input, record: &ResourceRecord) -> Option<Effect> {
    let id = record.id.clone();
    match input {
        Input::Start => Some(Effect::Start { id }),
        Input::Stop => Some(Effect::Stop { id }),
        Input::ToggleRun => match record.lifecycle_state {
            LifecycleState::Running => Some(Effect::Stop { id }),
            LifecycleState::Exited => Some(Effect::Start { id }),
            _ => None,
        },
        _ => None,
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { index.min(len - 1) }
}
