//! Theme and style definitions.

use ratatui::style::{Color, Modifier, Style};

/// Colors used by the chat panel.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Focused borders, active elements
    pub accent: Color,
    /// Live feed, successful states
    pub success: Color,
    /// Loading, sending, pending translation
    pub warning: Color,
    /// Alerts and offline feed
    pub error: Color,
    /// Timestamps, role labels, hints
    pub muted: Color,
    /// The viewer's own messages
    pub own: Color,
    /// Messages from everyone else
    pub other: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Yellow,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::DarkGray,
            own: Color::Cyan,
            other: Color::Green,
        }
    }
}

impl Theme {
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Sender name of the viewer's own messages.
    pub fn own_style(&self) -> Style {
        Style::default().fg(self.own).add_modifier(Modifier::BOLD)
    }

    /// Sender name of other participants' messages.
    pub fn other_style(&self) -> Style {
        Style::default().fg(self.other).add_modifier(Modifier::BOLD)
    }
}
