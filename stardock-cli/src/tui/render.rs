use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    },
};

use stardock_core::error::CommandKind;
use stardock_core::model::{ResourceRecord, ports_label};
use stardock_core::navigation::{MenuItem, Row as NavRow, Screen, flatten_rows};
use stardock_core::state::AppState;
use stardock_core::viewport::LogBuffer;

use super::keys::HELP;
use super::theme::{ACTIVE_GLYPH, styles};

/// Draw the whole dashboard. The main pane is bordered and sits between a
/// one-row status bar and a one-row hint bar, matching `state::LOG_CHROME`.
pub fn draw(f: &mut Frame, state: &AppState) {
    let [status_area, main_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    draw_status(f, status_area, state);

    match state.nav.screen() {
        Screen::Index => draw_index(f, main_area, state),
        Screen::ResourceTable => draw_table(f, main_area, state),
        Screen::LogView(_) => match state.logs.as_ref() {
            Some(buffer) => draw_logs(f, main_area, buffer),
            None => draw_placeholder(f, main_area, "Logs", "Loading logs..."),
        },
    }

    draw_hints(f, hint_area, state);

    if state.nav.show_help() {
        draw_help(f, f.area());
    }
}

fn draw_status(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![
        Span::styled(" stardock ", styles::title()),
        Span::styled(format!("· {} ", state.runtime_name), styles::text_dim()),
    ];
    if let Some(snapshot) = state.snapshot.as_ref() {
        spans.push(Span::styled(
            format!(
                "· {}/{} running ",
                snapshot.running_count(),
                snapshot.record_count()
            ),
            styles::text_dim(),
        ));
    }
    if let Some(banner) = state.banner.as_deref() {
        spans.push(Span::styled(format!("· ✗ {} ", banner), styles::error()));
    } else if let Some(status) = state.status.as_ref() {
        spans.push(Span::styled(format!("· {} ", status.message), styles::warn()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_hints(f: &mut Frame, area: Rect, state: &AppState) {
    let hints: &[(&str, &str)] = match state.nav.screen() {
        Screen::Index => &[("↑/↓", "move"), ("enter", "select"), ("q", "quit")],
        Screen::ResourceTable => &[
            ("enter", "logs/expand"),
            ("s", "start"),
            ("d", "stop"),
            ("space", "toggle"),
            ("r", "refresh"),
            ("esc", "back"),
            ("?", "help"),
        ],
        Screen::LogView(_) => &[
            ("↑/↓", "scroll"),
            ("g/G", "top/bottom"),
            ("f", "follow"),
            ("esc", "back"),
            ("?", "help"),
        ],
    };
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), styles::key_hint()));
        spans.push(Span::styled(format!("{} ", label), styles::text_dim()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn pane(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(title, styles::title()))
}

fn draw_placeholder(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let body = Paragraph::new(Span::styled(message.to_string(), styles::text_dim()))
        .block(pane(format!(" {} ", title)));
    f.render_widget(body, area);
}

fn draw_index(f: &mut Frame, area: Rect, state: &AppState) {
    let items: Vec<ListItem> = MenuItem::ALL
        .iter()
        .map(|item| ListItem::new(Span::styled(item.label(), styles::text())))
        .collect();
    let list = List::new(items)
        .block(pane(format!(" {} ", state.nav.screen().title())))
        .highlight_style(styles::selection())
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(state.nav.menu_index()));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_table(f: &mut Frame, area: Rect, state: &AppState) {
    let title = state.nav.screen().title();
    let Some(snapshot) = state.snapshot.as_ref() else {
        draw_placeholder(f, area, &title, "Loading containers...");
        return;
    };
    if snapshot.is_empty() {
        draw_placeholder(f, area, &title, "No containers");
        return;
    }

    let rows: Vec<Row> = flatten_rows(snapshot, state.nav.expanded_groups())
        .into_iter()
        .map(|row| table_row(row, state))
        .collect();

    let header = Row::new(
        ["", "Name", "Container ID", "Image", "Ports", "Status", "State", "Type"]
            .into_iter()
            .map(|h| Cell::from(h).style(styles::header())),
    );
    let widths = [
        Constraint::Length(2),
        Constraint::Percentage(20),
        Constraint::Length(12),
        Constraint::Percentage(18),
        Constraint::Percentage(18),
        Constraint::Percentage(22),
        Constraint::Length(10),
        Constraint::Length(13),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(pane(format!(" {} ", title)))
        .row_highlight_style(styles::selection());
    let mut table_state = TableState::default().with_selected(Some(state.nav.selected_index()));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn table_row<'a>(row: NavRow<'_>, state: &AppState) -> Row<'a> {
    let glyph = if row.is_active() { ACTIVE_GLYPH } else { "" };
    let glyph = Cell::from(glyph.to_string()).style(styles::active());

    match row {
        NavRow::Group { group, expanded } => {
            let marker = if expanded { "▾" } else { "▸" };
            Row::new(vec![
                glyph,
                Cell::from(format!("{} {}", marker, group.name)).style(styles::group()),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(format!(
                    "{}/{} running",
                    group.running_count(),
                    group.members.len()
                ))
                .style(styles::text_dim()),
                Cell::from(""),
                Cell::from("compose_stack").style(styles::text_dim()),
            ])
        }
        NavRow::Member { record, .. } => record_row(glyph, record, "  ", state),
        NavRow::Standalone(record) => record_row(glyph, record, "", state),
    }
}

fn record_row<'a>(glyph: Cell<'a>, record: &ResourceRecord, indent: &str, state: &AppState) -> Row<'a> {
    let status = match (state.pending.get(&record.id), state.notice_for(&record.id)) {
        (Some(CommandKind::Start), _) => Cell::from("starting...").style(styles::warn()),
        (Some(CommandKind::Stop), _) => Cell::from("stopping...").style(styles::warn()),
        (None, Some(notice)) => Cell::from(format!("✗ {}", notice)).style(styles::error()),
        (None, None) => Cell::from(record.status_text.clone()).style(styles::text()),
    };
    Row::new(vec![
        glyph,
        Cell::from(format!("{}{}", indent, record.display_name)).style(styles::text()),
        Cell::from(record.short_id()).style(styles::text_dim()),
        Cell::from(record.image_ref.clone()).style(styles::text_dim()),
        Cell::from(ports_label(&record.port_bindings)).style(styles::text_dim()),
        status,
        Cell::from(record.lifecycle_state.as_str()).style(styles::lifecycle(record.lifecycle_state)),
        Cell::from("container").style(styles::text_dim()),
    ])
}

fn draw_logs(f: &mut Frame, area: Rect, buffer: &LogBuffer) {
    let mut footer = vec![Span::styled(format!(" {}% ", buffer.percent()), styles::text_dim())];
    if buffer.follow_mode() {
        footer.push(Span::styled("follow ", styles::key_hint()));
    }
    if let Some(error) = buffer.error() {
        footer.push(Span::styled(format!("✗ {} ", error), styles::error()));
    }

    let block = pane(format!(" Logs: {} ", buffer.name)).title_bottom(Line::from(footer));

    let body: Vec<Line> = if !buffer.is_loaded() {
        vec![Line::from(Span::styled("Loading logs...", styles::text_dim()))]
    } else if buffer.lines().is_empty() {
        vec![Line::from(Span::styled("No log output", styles::text_dim()))]
    } else {
        buffer
            .visible()
            .iter()
            .map(|line| Line::from(Span::styled(line.clone(), styles::text())))
            .collect()
    };
    f.render_widget(Paragraph::new(body).block(block), area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let height = (HELP.len() as u16 + 2).min(area.height);
    let width = 56.min(area.width);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(key, label)| {
            Line::from(vec![
                Span::styled(format!("  {:<12}", key), styles::key_hint()),
                Span::styled(*label, styles::text()),
            ])
        })
        .collect();

    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(pane(" Help ".to_string())), popup);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::{Terminal, backend::TestBackend};

    use stardock_core::model::RawResource;
    use stardock_core::navigation::{Input, TableLayout};
    use stardock_core::reducer::{Action, AppEvent, reduce};

    use super::*;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::new(TableLayout::Table, Duration::from_secs(1), "demo");
        reduce(&mut state, AppEvent::Resize { width: 120, height: 20 });
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let Some(Action::FetchResources(ticket)) = actions.into_iter().next() else {
            panic!("expected a resource fetch");
        };
        let raw = vec![
            RawResource {
                id: "aaaaaaaaaaaaaaaa".into(),
                names: vec!["/shop-api-1".into()],
                state: Some("running".into()),
                group: Some("shop".into()),
                ..Default::default()
            },
            RawResource {
                id: "bbbbbbbbbbbbbbbb".into(),
                names: vec!["/redis".into()],
                state: Some("exited".into()),
                ..Default::default()
            },
        ];
        reduce(&mut state, AppEvent::ResourcesFetched { ticket, result: Ok(raw) });
        state
    }

    #[test]
    fn test_table_shows_groups_and_glyph() {
        let mut state = loaded_state();
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("▸ shop"));
        assert!(text.contains("redis"));
        assert!(text.contains("compose_stack"));
        assert!(text.contains(ACTIVE_GLYPH));
        assert!(!text.contains("shop-api-1"));

        reduce(&mut state, AppEvent::Input(Input::Down));
        reduce(&mut state, AppEvent::Input(Input::Down));
        reduce(&mut state, AppEvent::Input(Input::Enter));
        terminal.draw(|f| draw(f, &state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("▾ shop"));
        assert!(text.contains("  shop-api-1"));
    }

    #[test]
    fn test_banner_in_status_bar() {
        let mut state = loaded_state();
        state.banner = Some("container runtime unavailable: refused".into());
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();
        assert!(buffer_text(&terminal).contains("unavailable: refused"));
    }

    #[test]
    fn test_help_overlay() {
        let mut state = loaded_state();
        reduce(&mut state, AppEvent::Input(Input::ToggleHelp));
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &state)).unwrap();
        assert!(buffer_text(&terminal).contains("Toggle log follow mode"));
    }
}
