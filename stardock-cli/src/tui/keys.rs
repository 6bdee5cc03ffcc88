use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use stardock_core::navigation::Input;
use stardock_core::reducer::AppEvent;

/// Decode a terminal event into something the reducer understands
pub fn translate(event: CEvent) -> Option<AppEvent> {
    match event {
        CEvent::Key(key) => key_to_input(key).map(AppEvent::Input),
        CEvent::Resize(width, height) => Some(AppEvent::Resize { width, height }),
        _ => None,
    }
}

pub fn key_to_input(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Input::Quit),
            KeyCode::Char('u') => Some(Input::PageUp),
            KeyCode::Char('d') => Some(Input::PageDown),
            _ => None,
        };
    }

    let input = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Input::Up,
        KeyCode::Down | KeyCode::Char('j') => Input::Down,
        KeyCode::PageUp => Input::PageUp,
        KeyCode::PageDown => Input::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Input::Home,
        KeyCode::End | KeyCode::Char('G') => Input::End,
        KeyCode::Enter => Input::Enter,
        KeyCode::Left | KeyCode::Char('h') => Input::Left,
        KeyCode::Right | KeyCode::Char('l') => Input::Right,
        KeyCode::Char('s') => Input::Start,
        KeyCode::Char('d') => Input::Stop,
        KeyCode::Char(' ') => Input::ToggleRun,
        KeyCode::Char('f') => Input::ToggleFollow,
        KeyCode::Char('r') => Input::Refresh,
        KeyCode::Esc | KeyCode::Backspace => Input::Back,
        KeyCode::Char('?') => Input::ToggleHelp,
        KeyCode::Char('q') => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// Key reference shown in the help overlay
pub const HELP: &[(&str, &str)] = &[
    ("↑/↓ j/k", "Move selection / scroll logs"),
    ("PgUp/PgDn", "Page up / down"),
    ("g / G", "Jump to top / bottom"),
    ("enter", "Open logs, or expand/collapse a stack"),
    ("←/→ h/l", "Leave / enter a stack (tree layout)"),
    ("s", "Start selected container"),
    ("d", "Stop selected container"),
    ("space", "Stop if running, start if exited"),
    ("f", "Toggle log follow mode"),
    ("r", "Refresh now"),
    ("esc", "Back"),
    ("?", "Toggle this help"),
    ("q", "Quit"),
];
