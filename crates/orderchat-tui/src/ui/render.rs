//! Main render function for the TUI.

use chrono::Local;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::Frame;

use orderchat_core::{Alignment, RenderedMessage};
use orderchat_panel::PanelPhase;
use orderchat_ui::{
    AlertDialog, BubbleSide, ChatBubble, ChatWidget, Footer, Header, HeaderStat, InputField,
    StatusIndicator, Theme,
};

use crate::event::FeedStatus;
use crate::state::UiState;

fn bubble(msg: RenderedMessage) -> ChatBubble {
    let attachment = msg.attachment.map(|file| match file.size_label {
        Some(size) => format!("{} ({})", file.name, size),
        None => file.name,
    });

    ChatBubble {
        side: match msg.alignment {
            Alignment::Left => BubbleSide::Left,
            Alignment::Right => BubbleSide::Right,
        },
        sender: msg.sender_name,
        badge: msg.role_label,
        time: msg.created_at.with_timezone(&Local),
        body: msg.text,
        pending: msg.translation_pending,
        attachment,
    }
}

fn feed_indicator(feed: FeedStatus) -> StatusIndicator {
    match feed {
        FeedStatus::Connecting => StatusIndicator::warning("연결 중"),
        FeedStatus::Live => StatusIndicator::success("실시간"),
        FeedStatus::Offline => StatusIndicator::error("오프라인"),
    }
}

/// Render the entire UI. Returns the chat log's largest scroll offset.
pub fn render(frame: &mut Frame, state: &UiState) -> usize {
    let theme = Theme::default();
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area, state, &theme);
    let max_scroll = render_chat(frame, chat_area, state, &theme);

    InputField::new(state.panel.draft())
        .cursor(state.cursor)
        .focused(state.panel.alert().is_none())
        .busy(state.panel.is_sending())
        .placeholder("메시지를 입력하세요")
        .theme(theme.clone())
        .render(frame, input_area);

    render_footer(frame, footer_area, state, &theme);

    if let Some(reason) = state.panel.alert() {
        AlertDialog::new("전송 실패", reason)
            .theme(theme)
            .render(frame);
    }

    max_scroll
}

fn render_header(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let subtitle = match state.panel.reservation() {
        Some(reservation) => format!("예약번호 {}", reservation),
        None => "대화 없음".to_string(),
    };

    Header::new("orderchat")
        .subtitle(&subtitle)
        .status(feed_indicator(state.feed))
        .stat(HeaderStat::new("메시지", state.panel.log().len().to_string()))
        .theme(theme.clone())
        .render(frame, area);
}

fn render_chat(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) -> usize {
    let bubbles: Vec<ChatBubble> = state
        .panel
        .rendered(&state.viewer_id)
        .into_iter()
        .map(bubble)
        .collect();

    let mut widget = ChatWidget::new(&bubbles)
        .scroll_back(state.panel.scroll_back())
        .theme(theme.clone());
    if state.panel.phase() == PanelPhase::Loading {
        widget = widget.empty_text("불러오는 중...");
    }

    let max_scroll = widget.max_scroll(area);
    widget.render(frame, area);
    max_scroll
}

fn render_footer(frame: &mut Frame, area: Rect, state: &UiState, theme: &Theme) {
    let (status, style) = match &state.status_message {
        Some(message) => (message.as_str(), theme.error_style()),
        None if state.panel.is_sending() => ("전송 중", theme.warning_style()),
        None => ("Ready", Style::default().fg(Color::Green)),
    };

    Footer::new()
        .status(status, style)
        .key("Enter", "전송")
        .key("PgUp/PgDn", "스크롤")
        .key("Esc", "종료")
        .theme(theme.clone())
        .render(frame, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use orderchat_core::{
        ChatMessage, Language, MessageId, MessageType, ReservationNumber, SenderRole, UserId,
    };
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn message(id: &str, sender: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            reservation_number: ReservationNumber::parse("DL-2024-0001").unwrap(),
            sender_id: Some(UserId::new(sender)),
            sender_name: sender.to_string(),
            sender_role: SenderRole::Other("buyer".to_string()),
            original_message: text.to_string(),
            original_language: Language::Ko,
            translated_message: None,
            translated_language: None,
            message_type: MessageType::Text,
            file_url: None,
            file_name: None,
            file_size: None,
            service_type: None,
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_renders_conversation_and_alert() {
        let reservation = ReservationNumber::parse("DL-2024-0001").unwrap();
        let mut state = UiState::new(UserId::new("u1"));
        state.panel.open(reservation.clone());
        state.panel.load_completed(
            &reservation,
            vec![message("m1", "u2", "hello"), message("m2", "u1", "see you")],
        );
        state.panel.set_draft("x");
        state.panel.begin_send().unwrap();
        state.panel.send_failed("insert refused");

        let mut terminal = Terminal::new(TestBackend::new(70, 24)).unwrap();
        let mut max_scroll = usize::MAX;
        terminal
            .draw(|frame| max_scroll = render(frame, &state))
            .unwrap();
        let text = screen(&terminal);

        assert!(text.contains("DL-2024-0001"));
        assert!(text.contains("hello"));
        assert!(text.contains("see you"));
        assert!(text.contains("insert refused"));
        assert!(text.contains("Enter"));
        assert_eq!(max_scroll, 0);
    }

    #[test]
    fn test_file_message_bubble() {
        let mut msg = message("m1", "u2", "");
        msg.message_type = MessageType::File;
        msg.file_name = Some("inspection.pdf".to_string());
        msg.file_size = Some(1_310_720);

        let rendered = orderchat_core::render_message(&msg, &UserId::new("u1"));
        let bubble = bubble(rendered);
        assert_eq!(bubble.side, BubbleSide::Left);
        assert_eq!(bubble.attachment.as_deref(), Some("inspection.pdf (1.25MB)"));
        assert_eq!(bubble.badge, "buyer");
    }
}
