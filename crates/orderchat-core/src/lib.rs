//! orderchat Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - The hosted data service
//! - Runtime specifics
//!
//! Everything here describes one reservation's chat conversation: the
//! message rows, how a log of them is reconciled against change events,
//! who is sending, and how a message is shown to the viewer.

pub mod error;
pub mod identity;
pub mod ids;
pub mod language;
pub mod log;
pub mod message;
pub mod view;

// Re-export commonly used types
pub use error::CoreError;
pub use identity::{
    resolve_sender, AuthUser, CallerIdentity, SenderIdentity, UserMetadata, UserProfile, Viewer,
    PLACEHOLDER_USER_ID,
};
pub use ids::{MessageId, ReservationNumber, UserId};
pub use language::detect_language;
pub use log::{Applied, ChangeEvent, MessageLog};
pub use message::{ChatMessage, Language, MessageType, NewChatMessage, SenderRole};
pub use view::{display_text, render_log, render_message, Alignment, Attachment, RenderedMessage};
