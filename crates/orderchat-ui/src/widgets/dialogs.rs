//! Alert dialog and the draft input field.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use unicode_width::UnicodeWidthChar;

use crate::theme::Theme;
use crate::utils::{display_width, wrap_text};

/// Create a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Modal alert that stays up until the user dismisses it.
#[derive(Debug, Clone)]
pub struct AlertDialog<'a> {
    title: &'a str,
    message: &'a str,
    hint: &'a str,
    width: u16,
    theme: Theme,
}

impl<'a> AlertDialog<'a> {
    pub fn new(title: &'a str, message: &'a str) -> Self {
        Self {
            title,
            message,
            hint: "[아무 키] 닫기",
            width: 50,
            theme: Theme::default(),
        }
    }

    /// Dismissal hint on the last line.
    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = hint;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let screen = frame.area();
        let width = self.width.min(screen.width);
        let text_width = width.saturating_sub(4) as usize;

        let mut lines = vec![Line::from("")];
        for text in wrap_text(self.message, text_width) {
            lines.push(Line::from(text));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(self.hint, self.theme.muted_style())));

        let height = (lines.len() + 2) as u16;
        let area = centered_rect(width, height, screen);
        frame.render_widget(Clear, area);

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" {} ", self.title),
                        self.theme.error_style().add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(self.theme.error_style()),
            )
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}

/// Single-line text input.
#[derive(Debug, Clone)]
pub struct InputField<'a> {
    value: &'a str,
    /// Cursor position in characters.
    cursor: usize,
    focused: bool,
    busy: bool,
    title: &'a str,
    placeholder: Option<&'a str>,
    theme: Theme,
}

impl<'a> InputField<'a> {
    pub fn new(value: &'a str) -> Self {
        Self {
            value,
            cursor: value.chars().count(),
            focused: false,
            busy: false,
            title: " 메시지 ",
            placeholder: None,
            theme: Theme::default(),
        }
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Mark the field as waiting on a submission.
    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Text to draw, with a `|` at the cursor when focused.
    pub fn render_text(&self) -> String {
        if self.value.is_empty() && !self.focused {
            return self.placeholder.unwrap_or_default().to_string();
        }

        if self.focused {
            let char_count = self.value.chars().count();
            let cursor_pos = self.cursor.min(char_count);
            let before: String = self.value.chars().take(cursor_pos).collect();
            let after: String = self.value.chars().skip(cursor_pos).collect();
            format!("{}|{}", before, after)
        } else {
            self.value.to_string()
        }
    }

    pub fn style(&self) -> Style {
        if self.busy || (self.value.is_empty() && !self.focused) {
            self.theme.muted_style()
        } else {
            Style::default().fg(Color::White)
        }
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2) as usize;
        let text = tail_fit(&self.render_text(), inner_width);

        let border_style = if self.busy {
            self.theme.warning_style()
        } else if self.focused {
            self.theme.focused_border()
        } else {
            self.theme.unfocused_border()
        };
        let title = if self.busy { " 전송 중... " } else { self.title };

        let paragraph = Paragraph::new(Line::from(Span::styled(text, self.style()))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );

        frame.render_widget(paragraph, area);
    }
}

/// Keep the end of `text` that fits in `width` columns.
fn tail_fit(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }

    let mut kept: Vec<char> = Vec::new();
    let mut used = 0;
    for ch in text.chars().rev() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        kept.push(ch);
    }
    kept.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(50, 10, area), Rect::new(25, 15, 50, 10));
        assert_eq!(centered_rect(200, 10, area), Rect::new(0, 15, 100, 10));
    }

    #[test]
    fn test_alert_shows_reason_and_hint() {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|frame| {
                AlertDialog::new("Send failed", "permission denied for table chat_messages")
                    .hint("press any key")
                    .render(frame)
            })
            .unwrap();

        let rows = screen(&terminal);
        assert!(rows.iter().any(|row| row.contains("Send failed")));
        assert!(rows.iter().any(|row| row.contains("press any key")));
        let message: String = rows.concat();
        assert!(message.contains("permission denied"));
    }

    #[test]
    fn test_input_render_text() {
        assert_eq!(InputField::new("abc").focused(true).cursor(1).render_text(), "a|bc");
        assert_eq!(InputField::new("abc").render_text(), "abc");
        assert_eq!(
            InputField::new("").placeholder("type here").render_text(),
            "type here"
        );
        assert_eq!(InputField::new("").focused(true).render_text(), "|");
    }

    #[test]
    fn test_long_input_keeps_the_end_visible() {
        assert_eq!(tail_fit("abcdef", 4), "cdef");
        assert_eq!(tail_fit("안녕하세요", 5), "세요");
        assert_eq!(tail_fit("abc", 10), "abc");
    }

    #[test]
    fn test_focused_input_shows_cursor() {
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        terminal
            .draw(|frame| {
                InputField::new("draft")
                    .title(" Message ")
                    .focused(true)
                    .render(frame, frame.area())
            })
            .unwrap();
        let rows = screen(&terminal);
        assert!(rows[0].contains("Message"));
        assert!(rows[1].contains("draft|"));
    }
}
