//! Chat log widget: one bubble per message, own messages on the right.

use chrono::{DateTime, Local};
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;
use crate::utils::{truncate, wrap_text, wrap_text_indented};

/// Side of the log a bubble is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSide {
    Left,
    Right,
}

/// A single message as the widget draws it.
#[derive(Debug, Clone)]
pub struct ChatBubble {
    pub side: BubbleSide,
    pub sender: String,
    /// Role label shown next to the sender.
    pub badge: String,
    pub time: DateTime<Local>,
    pub body: String,
    /// Draw the pending-translation marker under the body.
    pub pending: bool,
    /// File name and size, for file messages.
    pub attachment: Option<String>,
}

/// Scrollable chat log.
#[derive(Debug, Clone)]
pub struct ChatWidget<'a> {
    bubbles: &'a [ChatBubble],
    /// Lines scrolled up from the bottom.
    scroll_back: usize,
    focused: bool,
    title: Option<String>,
    empty_text: &'a str,
    pending_label: &'a str,
    theme: Theme,
}

impl<'a> ChatWidget<'a> {
    pub fn new(bubbles: &'a [ChatBubble]) -> Self {
        Self {
            bubbles,
            scroll_back: 0,
            focused: false,
            title: None,
            empty_text: "아직 메시지가 없습니다",
            pending_label: "번역 대기 중",
            theme: Theme::default(),
        }
    }

    /// Lines scrolled up from the bottom; 0 shows the newest message.
    pub fn scroll_back(mut self, lines: usize) -> Self {
        self.scroll_back = lines;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text shown when there are no messages.
    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    /// Marker drawn under messages still waiting for a translation.
    pub fn pending_label(mut self, label: &'a str) -> Self {
        self.pending_label = label;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Largest useful `scroll_back` for the given area.
    pub fn max_scroll(&self, area: Rect) -> usize {
        let visible_height = area.height.saturating_sub(2) as usize;
        let text_width = area.width.saturating_sub(2) as usize;
        self.build_lines(text_width)
            .len()
            .saturating_sub(visible_height)
    }

    fn build_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for bubble in self.bubbles {
            lines.extend(self.bubble_lines(bubble, width));
            lines.push(Line::from(""));
        }
        lines
    }

    fn bubble_lines(&self, bubble: &ChatBubble, width: usize) -> Vec<Line<'static>> {
        let body_width = (width * 3 / 4).max(1);
        let time = bubble.time.format("%H:%M").to_string();
        let sender = truncate(&bubble.sender, body_width);
        let muted = self.theme.muted_style();

        let mut lines = Vec::new();
        match bubble.side {
            BubbleSide::Left => {
                lines.push(Line::from(vec![
                    Span::styled(sender, self.theme.other_style()),
                    Span::styled(format!(" {}  {}", bubble.badge, time), muted),
                ]));
                for text in wrap_text_indented(&bubble.body, body_width, "  ") {
                    lines.push(Line::from(text));
                }
                if let Some(attachment) = &bubble.attachment {
                    lines.push(Line::from(Span::styled(
                        format!("  [file] {}", attachment),
                        muted,
                    )));
                }
                if bubble.pending {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", self.pending_label),
                        self.theme.warning_style(),
                    )));
                }
            }
            BubbleSide::Right => {
                lines.push(
                    Line::from(vec![
                        Span::styled(format!("{}  {} ", time, bubble.badge), muted),
                        Span::styled(sender, self.theme.own_style()),
                    ])
                    .alignment(Alignment::Right),
                );
                for text in wrap_text(&bubble.body, body_width) {
                    lines.push(Line::from(text).alignment(Alignment::Right));
                }
                if let Some(attachment) = &bubble.attachment {
                    lines.push(
                        Line::from(Span::styled(format!("[file] {}", attachment), muted))
                            .alignment(Alignment::Right),
                    );
                }
                if bubble.pending {
                    lines.push(
                        Line::from(Span::styled(
                            self.pending_label.to_string(),
                            self.theme.warning_style(),
                        ))
                        .alignment(Alignment::Right),
                    );
                }
            }
        }
        lines
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            self.theme.focused_border()
        } else {
            self.theme.unfocused_border()
        };

        let visible_height = area.height.saturating_sub(2) as usize;
        let text_width = area.width.saturating_sub(2) as usize;

        let all_lines = if self.bubbles.is_empty() {
            vec![Line::from(Span::styled(
                self.empty_text.to_string(),
                self.theme.muted_style(),
            ))
            .alignment(Alignment::Center)]
        } else {
            self.build_lines(text_width)
        };
        let total_lines = all_lines.len();

        // Offset counted from the top, derived from the distance to the bottom.
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll_offset = max_scroll - self.scroll_back.min(max_scroll);

        let lines: Vec<Line> = all_lines
            .into_iter()
            .skip(scroll_offset)
            .take(visible_height)
            .collect();

        let title = match self.title {
            Some(title) => title,
            None if self.bubbles.is_empty() => " Chat ".to_string(),
            None => {
                let first_line = scroll_offset + 1;
                let last_line = (scroll_offset + visible_height).min(total_lines);
                format!(" Chat [{}-{}/{}] ", first_line, last_line, total_lines)
            }
        };

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );

        frame.render_widget(paragraph, area);
    }
}
