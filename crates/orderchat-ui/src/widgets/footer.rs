//! Footer widget: status text followed by key hints.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct Footer<'a> {
    status: Option<(&'a str, Style)>,
    keys: Vec<(&'a str, &'a str)>,
    theme: Theme,
}

impl<'a> Footer<'a> {
    pub fn new() -> Self {
        Self {
            status: None,
            keys: Vec::new(),
            theme: Theme::default(),
        }
    }

    /// Status text shown before the key hints.
    pub fn status(mut self, text: &'a str, style: Style) -> Self {
        self.status = Some((text, style));
        self
    }

    /// Add a key hint, e.g. `("Enter", "send")`.
    pub fn key(mut self, key: &'a str, action: &'a str) -> Self {
        self.keys.push((key, action));
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let muted = self.theme.muted_style();
        let mut spans = Vec::new();

        if let Some((text, style)) = self.status {
            spans.push(Span::styled(format!(" {} ", text), style));
            spans.push(Span::styled("|", muted));
        }
        for (key, action) in self.keys {
            spans.push(Span::styled(
                format!(" {}", key),
                muted.add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(format!(": {} ", action), muted));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Default for Footer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_footer_lists_keys() {
        let mut terminal = Terminal::new(TestBackend::new(60, 1)).unwrap();
        terminal
            .draw(|frame| {
                Footer::new()
                    .status("Ready", Style::default())
                    .key("Enter", "send")
                    .key("Esc", "quit")
                    .render(frame, frame.area())
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..buffer.area.width)
            .map(|x| buffer[(x, 0)].symbol())
            .collect();
        assert!(row.starts_with(" Ready | Enter: send  Esc: quit"));
    }
}
