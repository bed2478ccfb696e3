//! How a message is presented to the viewer.

use chrono::{DateTime, Utc};

use crate::ids::{MessageId, UserId};
use crate::log::MessageLog;
use crate::message::{ChatMessage, Language, MessageType};

/// Which side of the conversation a message sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Someone else's message.
    Left,
    /// The viewer's own message.
    Right,
}

/// File shared in a non-text message.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub url: Option<String>,
    /// Size in megabytes with two decimals, e.g. `"1.25MB"`.
    pub size_label: Option<String>,
}

/// A message ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub id: MessageId,
    pub alignment: Alignment,
    pub sender_name: String,
    pub role_label: String,
    pub text: String,
    /// Chinese message still waiting for its Korean translation.
    pub translation_pending: bool,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// Text shown for a message.
///
/// Chinese messages show their Korean translation once it exists; every
/// other message shows the original text.
pub fn display_text(msg: &ChatMessage) -> &str {
    match (&msg.original_language, &msg.translated_message) {
        (Language::Zh, Some(translated)) => translated,
        _ => &msg.original_message,
    }
}

fn size_label(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Render one message for the given viewer.
pub fn render_message(msg: &ChatMessage, viewer_id: &UserId) -> RenderedMessage {
    let alignment = if msg.sender_id.as_ref() == Some(viewer_id) {
        Alignment::Right
    } else {
        Alignment::Left
    };

    let attachment = match msg.message_type {
        MessageType::Text => None,
        _ => Some(Attachment {
            name: msg.file_name.clone().unwrap_or_default(),
            url: msg.file_url.clone(),
            size_label: msg.file_size.map(size_label),
        }),
    };

    RenderedMessage {
        id: msg.id.clone(),
        alignment,
        sender_name: msg.sender_name.clone(),
        role_label: msg.sender_role.label().to_string(),
        text: display_text(msg).to_string(),
        translation_pending: msg.original_language == Language::Zh
            && msg.translated_message.is_none(),
        attachment,
        created_at: msg.created_at,
    }
}

/// Render a whole log in display order.
pub fn render_log(log: &MessageLog, viewer_id: &UserId) -> Vec<RenderedMessage> {
    log.iter().map(|msg| render_message(msg, viewer_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ReservationNumber;
    use crate::message::SenderRole;

    fn message(sender: &str, text: &str, lang: Language) -> ChatMessage {
        ChatMessage {
            id: MessageId::generate(),
            reservation_number: ReservationNumber::parse("DL-2024-0001").unwrap(),
            sender_id: Some(UserId::new(sender)),
            sender_name: sender.to_string(),
            sender_role: SenderRole::Customer,
            original_message: text.to_string(),
            original_language: lang,
            translated_message: None,
            translated_language: None,
            message_type: MessageType::Text,
            file_url: None,
            file_name: None,
            file_size: None,
            service_type: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_own_message_aligns_right() {
        let viewer = UserId::new("u1");
        let mine = render_message(&message("u1", "네", Language::Ko), &viewer);
        let theirs = render_message(&message("u2", "네", Language::Ko), &viewer);

        assert_eq!(mine.alignment, Alignment::Right);
        assert_eq!(theirs.alignment, Alignment::Left);
    }

    #[test]
    fn test_chinese_message_shows_translation() {
        let mut msg = message("u2", "您好", Language::Zh);
        assert_eq!(display_text(&msg), "您好");
        assert!(render_message(&msg, &UserId::new("u1")).translation_pending);

        msg.translated_message = Some("안녕하세요".to_string());
        assert_eq!(display_text(&msg), "안녕하세요");
        assert!(!render_message(&msg, &UserId::new("u1")).translation_pending);
    }

    #[test]
    fn test_korean_message_keeps_original() {
        let mut msg = message("u1", "검품 일정 문의드립니다", Language::Ko);
        msg.translated_message = Some("询问验货日程".to_string());
        assert_eq!(display_text(&msg), "검품 일정 문의드립니다");
    }

    #[test]
    fn test_file_message_attachment() {
        let mut msg = message("u2", "파일을 업로드했습니다: quote.pdf", Language::Ko);
        msg.message_type = MessageType::File;
        msg.file_name = Some("quote.pdf".to_string());
        msg.file_size = Some(1_310_720);

        let rendered = render_message(&msg, &UserId::new("u1"));
        let attachment = rendered.attachment.unwrap();
        assert_eq!(attachment.name, "quote.pdf");
        assert_eq!(attachment.size_label.as_deref(), Some("1.25MB"));
    }
}
