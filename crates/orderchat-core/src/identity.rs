//! Viewer context and sender identity resolution.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::message::SenderRole;

/// Sender id used when neither a session nor the caller names a user.
pub const PLACEHOLDER_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

const UNKNOWN_SENDER_NAME: &str = "Unknown";

/// Free-form metadata attached to an auth user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// The authenticated user of the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Business profile row of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Identity hints supplied by whoever mounts the panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerIdentity {
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub role: Option<SenderRole>,
}

/// Resolved identity stamped onto an outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderIdentity {
    pub id: UserId,
    pub name: String,
    pub role: SenderRole,
}

/// Who is looking at the panel.
///
/// Passed in explicitly so the panel never reaches for a global session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Viewer {
    /// Live session, when one is known at mount time.
    pub session: Option<AuthUser>,
    /// Fallbacks for when the session is unavailable.
    pub overrides: CallerIdentity,
}

impl Viewer {
    /// A viewer with a live session.
    pub fn with_session(session: AuthUser) -> Self {
        Self {
            session: Some(session),
            overrides: CallerIdentity::default(),
        }
    }

    /// A viewer known only through caller-supplied hints.
    pub fn anonymous(overrides: CallerIdentity) -> Self {
        Self {
            session: None,
            overrides,
        }
    }

    /// Id used to decide which messages are "mine".
    pub fn id(&self) -> UserId {
        self.session
            .as_ref()
            .map(|user| user.id.clone())
            .or_else(|| self.overrides.user_id.clone())
            .unwrap_or_else(|| UserId::new(PLACEHOLDER_USER_ID))
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Resolve the sender of an outgoing message.
///
/// Order of preference: live session, its profile, caller overrides,
/// then literal placeholders.
pub fn resolve_sender(
    session: Option<&AuthUser>,
    profile: Option<&UserProfile>,
    overrides: &CallerIdentity,
) -> SenderIdentity {
    let id = session
        .map(|user| user.id.clone())
        .or_else(|| overrides.user_id.clone())
        .unwrap_or_else(|| UserId::new(PLACEHOLDER_USER_ID));

    let name = profile
        .and_then(|p| non_blank(p.contact_person.as_ref()).or(non_blank(p.company_name.as_ref())))
        .or_else(|| session.and_then(|u| non_blank(u.email.as_ref())))
        .or_else(|| session.and_then(|u| non_blank(u.user_metadata.name.as_ref())))
        .or_else(|| non_blank(overrides.name.as_ref()))
        .unwrap_or(UNKNOWN_SENDER_NAME)
        .to_string();

    let role = profile
        .and_then(|p| non_blank(p.role.as_ref()))
        .or_else(|| session.and_then(|u| non_blank(u.user_metadata.role.as_ref())))
        .map(SenderRole::from)
        .or_else(|| overrides.role.clone())
        .unwrap_or_default();

    SenderIdentity { id, name, role }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: UserId::new(id),
            email: email.map(str::to_string),
            user_metadata: UserMetadata::default(),
        }
    }

    #[test]
    fn test_session_and_profile_win() {
        let user = session("u1", Some("kim@example.com"));
        let profile = UserProfile {
            user_id: Some(UserId::new("u1")),
            contact_person: Some("김민수".to_string()),
            company_name: Some("두리무역".to_string()),
            role: Some("korean_team".to_string()),
        };
        let overrides = CallerIdentity {
            user_id: Some(UserId::new("other")),
            name: Some("Override".to_string()),
            role: Some(SenderRole::Admin),
        };

        let sender = resolve_sender(Some(&user), Some(&profile), &overrides);
        assert_eq!(sender.id.as_str(), "u1");
        assert_eq!(sender.name, "김민수");
        assert_eq!(sender.role, SenderRole::KoreanTeam);
    }

    #[test]
    fn test_company_name_then_email() {
        let user = session("u1", Some("kim@example.com"));
        let profile = UserProfile {
            company_name: Some("두리무역".to_string()),
            ..Default::default()
        };
        let sender = resolve_sender(Some(&user), Some(&profile), &CallerIdentity::default());
        assert_eq!(sender.name, "두리무역");

        let sender = resolve_sender(Some(&user), None, &CallerIdentity::default());
        assert_eq!(sender.name, "kim@example.com");
        assert_eq!(sender.role, SenderRole::Customer);
    }

    #[test]
    fn test_overrides_without_session() {
        let overrides = CallerIdentity {
            user_id: Some(UserId::new("staff-7")),
            name: Some("王芳".to_string()),
            role: Some(SenderRole::ChineseStaff),
        };

        let sender = resolve_sender(None, None, &overrides);
        assert_eq!(sender.id.as_str(), "staff-7");
        assert_eq!(sender.name, "王芳");
        assert_eq!(sender.role, SenderRole::ChineseStaff);
    }

    #[test]
    fn test_placeholder_identity() {
        let sender = resolve_sender(None, None, &CallerIdentity::default());
        assert_eq!(sender.id.as_str(), PLACEHOLDER_USER_ID);
        assert_eq!(sender.name, "Unknown");
        assert_eq!(sender.role, SenderRole::Customer);
    }

    #[test]
    fn test_viewer_id_fallbacks() {
        assert_eq!(Viewer::with_session(session("u1", None)).id().as_str(), "u1");

        let viewer = Viewer::anonymous(CallerIdentity {
            user_id: Some(UserId::new("u9")),
            ..Default::default()
        });
        assert_eq!(viewer.id().as_str(), "u9");
        assert_eq!(Viewer::default().id().as_str(), PLACEHOLDER_USER_ID);
    }
}
