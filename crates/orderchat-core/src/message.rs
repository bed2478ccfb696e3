//! Chat message rows and their enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::ids::{MessageId, ReservationNumber, UserId};

/// Language a message was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean.
    Ko,
    /// Chinese.
    Zh,
}

impl Language {
    /// Wire code of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::Zh => "zh",
        }
    }

    /// The language a message in `self` gets translated into.
    pub fn counterpart(&self) -> Language {
        match self {
            Language::Ko => Language::Zh,
            Language::Zh => Language::Ko,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ko" => Ok(Language::Ko),
            "zh" => Ok(Language::Zh),
            other => Err(CoreError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Kind of chat message. This client only produces `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    File,
    Image,
    Video,
}

impl MessageType {
    /// Wire name of the message type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::File => "file",
            MessageType::Image => "image",
            MessageType::Video => "video",
        }
    }
}

impl FromStr for MessageType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "file" => Ok(MessageType::File),
            "image" => Ok(MessageType::Image),
            "video" => Ok(MessageType::Video),
            other => Err(CoreError::UnsupportedMessageType(other.to_string())),
        }
    }
}

/// Role of the participant who sent a message.
///
/// Unknown roles are kept verbatim so rows written by other clients
/// survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SenderRole {
    #[default]
    Customer,
    KoreanTeam,
    ChineseStaff,
    Admin,
    Inspector,
    Factory,
    Other(String),
}

impl SenderRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &str {
        match self {
            SenderRole::Customer => "customer",
            SenderRole::KoreanTeam => "korean_team",
            SenderRole::ChineseStaff => "chinese_staff",
            SenderRole::Admin => "admin",
            SenderRole::Inspector => "inspector",
            SenderRole::Factory => "factory",
            SenderRole::Other(role) => role,
        }
    }

    /// Korean label shown next to the sender name.
    pub fn label(&self) -> &str {
        match self {
            SenderRole::Customer => "고객",
            SenderRole::KoreanTeam => "한국팀",
            SenderRole::ChineseStaff => "중국직원",
            SenderRole::Admin => "관리자",
            SenderRole::Inspector => "검수원",
            SenderRole::Factory => "공장",
            SenderRole::Other(role) => role,
        }
    }
}

impl From<String> for SenderRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "customer" => SenderRole::Customer,
            "korean_team" => SenderRole::KoreanTeam,
            "chinese_staff" => SenderRole::ChineseStaff,
            "admin" => SenderRole::Admin,
            "inspector" => SenderRole::Inspector,
            "factory" => SenderRole::Factory,
            _ => SenderRole::Other(s),
        }
    }
}

impl From<&str> for SenderRole {
    fn from(s: &str) -> Self {
        SenderRole::from(s.to_string())
    }
}

impl From<SenderRole> for String {
    fn from(role: SenderRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a nullable column, falling back to the type's default on `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored chat message row.
///
/// Nullable columns (`message_type`, `is_read`, `created_at`, ...) read as
/// their defaults when the service sends `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Service-assigned identifier.
    pub id: MessageId,
    /// Conversation this message belongs to.
    pub reservation_number: ReservationNumber,
    /// Sender snapshot at send time.
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_role: SenderRole,
    /// Text as typed.
    pub original_message: String,
    pub original_language: Language,
    /// Filled in later by the translation function.
    #[serde(default)]
    pub translated_message: Option<String>,
    #[serde(default)]
    pub translated_language: Option<Language>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_type: MessageType,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    /// Server-assigned timestamp, the display sort key. A missing one
    /// reads as the Unix epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build the stored form of an insert payload.
    pub fn from_new(new: NewChatMessage, id: MessageId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            reservation_number: new.reservation_number,
            sender_id: Some(new.sender_id),
            sender_name: new.sender_name,
            sender_role: new.sender_role,
            original_message: new.original_message,
            original_language: new.original_language,
            translated_message: None,
            translated_language: None,
            message_type: new.message_type,
            file_url: None,
            file_name: None,
            file_size: None,
            service_type: new.service_type,
            is_read: new.is_read,
            created_at,
        }
    }

    /// Whether the translation function has not filled this row in yet.
    pub fn needs_translation(&self) -> bool {
        self.translated_message.is_none() && !self.original_message.is_empty()
    }
}

/// Insert payload for a new message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub reservation_number: ReservationNumber,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_role: SenderRole,
    pub original_message: String,
    pub original_language: Language,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sender_role_keeps_unknown_roles() {
        let role = SenderRole::from("logistics");
        assert_eq!(role, SenderRole::Other("logistics".to_string()));
        assert_eq!(role.label(), "logistics");
        assert_eq!(SenderRole::ChineseStaff.label(), "중국직원");
    }

    #[test]
    fn test_deserialize_service_row() {
        let row = json!({
            "id": "8d0c",
            "reservation_number": "DL-2024-0001",
            "sender_id": "u1",
            "sender_name": "김민수",
            "sender_role": "korean_team",
            "original_message": "您好",
            "original_language": "zh",
            "translated_message": null,
            "message_type": "text",
            "created_at": "2024-05-01T09:30:00+00:00",
            "is_deleted": false
        });

        let msg: ChatMessage = serde_json::from_value(row).unwrap();
        assert_eq!(msg.sender_role, SenderRole::KoreanTeam);
        assert_eq!(msg.original_language, Language::Zh);
        assert!(msg.needs_translation());
        assert!(!msg.is_read);
    }

    #[test]
    fn test_deserialize_row_with_null_columns() {
        let row = json!({
            "id": "m2",
            "reservation_number": "DL-2024-0001",
            "sender_id": "u2",
            "sender_name": "王芳",
            "sender_role": "chinese_staff",
            "original_message": "您好",
            "original_language": "zh",
            "translated_message": null,
            "translated_language": null,
            "message_type": null,
            "file_name": null,
            "file_size": null,
            "file_url": null,
            "is_read": null,
            "is_deleted": null,
            "created_at": null
        });

        let msg: ChatMessage = serde_json::from_value(row).unwrap();
        assert_eq!(msg.message_type, MessageType::Text);
        assert!(!msg.is_read);
        assert_eq!(msg.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(msg.sender_role, SenderRole::ChineseStaff);
    }

    #[test]
    fn test_new_message_omits_missing_service_type() {
        let new = NewChatMessage {
            reservation_number: ReservationNumber::parse("DL-1").unwrap(),
            sender_id: UserId::new("u1"),
            sender_name: "Kim".to_string(),
            sender_role: SenderRole::Customer,
            original_message: "hi".to_string(),
            original_language: Language::Ko,
            message_type: MessageType::Text,
            service_type: None,
            is_read: false,
        };

        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["sender_role"], "customer");
        assert_eq!(value["message_type"], "text");
        assert!(value.get("service_type").is_none());
    }

    #[test]
    fn test_language_counterpart() {
        assert_eq!(Language::Ko.counterpart(), Language::Zh);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("en".parse::<Language>().is_err());
    }
}
