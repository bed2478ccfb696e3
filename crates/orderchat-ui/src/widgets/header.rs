//! Header widget: title, connection status, and a few stats.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;

/// Status indicator for the header.
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    pub label: String,
    pub color: Color,
}

impl StatusIndicator {
    pub fn new(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }

    pub fn success(label: impl Into<String>) -> Self {
        Self::new(label, Color::Green)
    }

    pub fn warning(label: impl Into<String>) -> Self {
        Self::new(label, Color::Yellow)
    }

    pub fn error(label: impl Into<String>) -> Self {
        Self::new(label, Color::Red)
    }
}

/// A labelled value shown on the right side of the header.
#[derive(Debug, Clone)]
pub struct HeaderStat {
    pub label: String,
    pub value: String,
    pub color: Color,
}

impl HeaderStat {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            color: Color::Cyan,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Header<'a> {
    title: &'a str,
    subtitle: Option<&'a str>,
    status: Option<StatusIndicator>,
    stats: Vec<HeaderStat>,
    theme: Theme,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            subtitle: None,
            status: None,
            stats: Vec::new(),
            theme: Theme::default(),
        }
    }

    /// Text shown after the title (e.g. the open reservation).
    pub fn subtitle(mut self, subtitle: &'a str) -> Self {
        self.subtitle = Some(subtitle);
        self
    }

    pub fn status(mut self, status: StatusIndicator) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stat(mut self, stat: HeaderStat) -> Self {
        self.stats.push(stat);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    fn stats_line(&self) -> Line<'static> {
        let mut spans = vec![Span::raw(" ")];
        for (i, stat) in self.stats.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", self.theme.muted_style()));
            }
            spans.push(Span::raw(format!("{}: ", stat.label)));
            spans.push(Span::styled(
                stat.value.clone(),
                Style::default().fg(stat.color),
            ));
        }
        spans.push(Span::raw(" "));
        Line::from(spans)
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let stats = (!self.stats.is_empty()).then(|| self.stats_line());
        let stats_width = stats
            .as_ref()
            .map(|line| line.width() as u16 + 2)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(stats_width)])
            .split(area);

        let mut title_spans = vec![Span::styled(
            format!(" {} ", self.title),
            Style::default()
                .fg(self.theme.own)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(status) = &self.status {
            title_spans.push(Span::styled(
                format!("[{}]", status.label),
                Style::default().fg(status.color),
            ));
            title_spans.push(Span::raw(" "));
        }

        let subtitle = self.subtitle.unwrap_or_default();
        let body = Paragraph::new(Line::from(format!(" {}", subtitle)))
            .block(Block::default().title(title_spans).borders(Borders::ALL));
        frame.render_widget(body, chunks[0]);

        if let Some(line) = stats {
            let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
            frame.render_widget(widget, chunks[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_header_shows_status_and_stats() {
        let mut terminal = Terminal::new(TestBackend::new(80, 3)).unwrap();
        terminal
            .draw(|frame| {
                Header::new("orderchat")
                    .subtitle("DL-2024-0001")
                    .status(StatusIndicator::success("live"))
                    .stat(HeaderStat::new("messages", "12"))
                    .render(frame, frame.area())
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect()
            })
            .collect();

        assert!(rows[0].contains("orderchat"));
        assert!(rows[0].contains("[live]"));
        assert!(rows[1].contains("DL-2024-0001"));
        assert!(rows[1].contains("messages: 12"));
    }
}
