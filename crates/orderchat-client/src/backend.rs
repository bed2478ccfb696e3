//! The seam between the chat panel and the data service.

use async_trait::async_trait;

use orderchat_core::{
    AuthUser, ChatMessage, NewChatMessage, ReservationNumber, UserId, UserProfile,
};

use crate::error::ClientError;
use crate::subscription::Subscription;

/// Operations the chat panel needs from the hosted data service.
///
/// Every method is a single request; none of them retry.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// All messages of a reservation, ordered by `created_at` ascending.
    async fn fetch_messages(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError>;

    /// Messages of a reservation that have no translation yet.
    async fn fetch_untranslated(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError>;

    /// Insert a message and return the stored row.
    async fn insert_message(&self, message: &NewChatMessage) -> Result<ChatMessage, ClientError>;

    /// Open a change feed of inserts and updates for a reservation.
    async fn subscribe(&self, reservation: &ReservationNumber)
        -> Result<Subscription, ClientError>;

    /// Ask the translation function to translate a stored row.
    async fn invoke_translation(&self, record: &ChatMessage) -> Result<(), ClientError>;

    /// The authenticated user of the current session, if any.
    async fn current_user(&self) -> Result<Option<AuthUser>, ClientError>;

    /// Profile row of a user, if one exists.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ClientError>;
}
