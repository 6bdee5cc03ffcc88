//! Color palette and style helpers for the dashboard

use ratatui::style::{Color, Modifier, Style};

use stardock_core::model::LifecycleState;

/// Glyph marking a running resource or a stack with a running member
pub const ACTIVE_GLYPH: &str = "⏺";

#[derive(Clone, Debug)]
pub struct Palette {
    pub panel_border: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub success: Color,
    pub warn: Color,
    pub error: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub key_hint: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            panel_border: Color::Rgb(60, 60, 60),
            text: Color::Rgb(212, 212, 212),
            text_dim: Color::Rgb(150, 150, 150),
            text_muted: Color::Rgb(100, 100, 100),
            accent: Color::Rgb(79, 193, 255),
            success: Color::Rgb(78, 201, 176),
            warn: Color::Rgb(220, 180, 100),
            error: Color::Rgb(244, 135, 113),
            selection_bg: Color::Rgb(38, 79, 120),
            selection_fg: Color::White,
            key_hint: Color::Rgb(206, 145, 120),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    pub fn lifecycle_style(&self, state: LifecycleState) -> Style {
        let color = match state {
            LifecycleState::Running => self.palette.success,
            LifecycleState::Restarting | LifecycleState::Paused | LifecycleState::Created => {
                self.palette.warn
            }
            LifecycleState::Dead | LifecycleState::Removing => self.palette.error,
            LifecycleState::Exited | LifecycleState::Unknown => self.palette.text_muted,
        };
        Style::default().fg(color)
    }

    pub fn active_style(&self) -> Style {
        Style::default().fg(self.palette.success)
    }

    pub fn group_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.palette.selection_bg)
            .fg(self.palette.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.palette.panel_border)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text)
    }

    pub fn text_dim_style(&self) -> Style {
        Style::default().fg(self.palette.text_dim)
    }

    pub fn key_hint_style(&self) -> Style {
        Style::default().fg(self.palette.key_hint)
    }

    pub fn warn_style(&self) -> Style {
        Style::default().fg(self.palette.warn)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.palette.error)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

/// Shorthands over the default theme
pub mod styles {
    use super::*;

    pub fn lifecycle(state: LifecycleState) -> Style {
        theme().lifecycle_style(state)
    }

    pub fn active() -> Style {
        theme().active_style()
    }

    pub fn group() -> Style {
        theme().group_style()
    }

    pub fn selection() -> Style {
        theme().selection_style()
    }

    pub fn border() -> Style {
        theme().border_style()
    }

    pub fn text() -> Style {
        theme().text_style()
    }

    pub fn text_dim() -> Style {
        theme().text_dim_style()
    }

    pub fn key_hint() -> Style {
        theme().key_hint_style()
    }

    pub fn warn() -> Style {
        theme().warn_style()
    }

    pub fn error() -> Style {
        theme().error_style()
    }

    pub fn title() -> Style {
        theme().title_style()
    }

    pub fn header() -> Style {
        theme().header_style()
    }
}
