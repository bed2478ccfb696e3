//! Async operations of the panel against a [`ChatBackend`].
//!
//! Fetch and insert are awaited by the caller. Translation requests are
//! spawned and never reported back: a missing translation only means the
//! original text stays on screen.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use orderchat_client::{ChatBackend, ClientError};
use orderchat_core::{
    detect_language, resolve_sender, ChatMessage, MessageType, NewChatMessage, ReservationNumber,
    SenderIdentity, Viewer,
};

use crate::config::PanelConfig;
use crate::state::SendRequest;

/// Fetch a reservation's conversation in display order.
pub async fn fetch_conversation<B: ChatBackend + ?Sized>(
    backend: &B,
    reservation: &ReservationNumber,
) -> Result<Vec<ChatMessage>, ClientError> {
    let rows = backend.fetch_messages(reservation).await?;
    debug!(reservation = %reservation, count = rows.len(), "Fetched messages");
    Ok(rows)
}

/// Work out who is sending.
///
/// Session and profile lookups are best-effort; a failure counts as absence.
pub async fn resolve_identity<B: ChatBackend + ?Sized>(
    backend: &B,
    viewer: &Viewer,
) -> SenderIdentity {
    let session = match &viewer.session {
        Some(user) => Some(user.clone()),
        None => match backend.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Could not read current session");
                None
            }
        },
    };

    let lookup_id = session
        .as_ref()
        .map(|user| user.id.clone())
        .or_else(|| viewer.overrides.user_id.clone());

    let profile = match lookup_id {
        Some(id) => match backend.fetch_profile(&id).await {
            Ok(profile) => profile,
            Err(e) => {
                debug!(user_id = %id, error = %e, "Profile lookup failed");
                None
            }
        },
        None => None,
    };

    resolve_sender(session.as_ref(), profile.as_ref(), &viewer.overrides)
}

/// Build the insert payload for an admitted send.
pub fn compose_message(
    request: &SendRequest,
    sender: SenderIdentity,
    config: &PanelConfig,
) -> NewChatMessage {
    NewChatMessage {
        reservation_number: request.reservation.clone(),
        sender_id: sender.id,
        sender_name: sender.name,
        sender_role: sender.role,
        original_message: request.text.clone(),
        original_language: detect_language(&request.text),
        message_type: MessageType::Text,
        service_type: config.service_type.clone(),
        is_read: false,
    }
}

/// Resolve the sender, classify the text, and insert the message.
pub async fn deliver<B: ChatBackend + ?Sized>(
    backend: &B,
    viewer: &Viewer,
    config: &PanelConfig,
    request: &SendRequest,
) -> Result<ChatMessage, ClientError> {
    let sender = resolve_identity(backend, viewer).await;
    let message = compose_message(request, sender, config);
    debug!(
        reservation = %message.reservation_number,
        sender_id = %message.sender_id,
        language = %message.original_language,
        "Sending message"
    );

    let stored = backend.insert_message(&message).await?;
    info!(id = %stored.id, reservation = %stored.reservation_number, "Message stored");
    Ok(stored)
}

/// Ask the translation function to translate a row, without waiting.
pub fn request_translation<B: ChatBackend + ?Sized>(
    backend: Arc<B>,
    record: ChatMessage,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = backend.invoke_translation(&record).await {
            warn!(id = %record.id, error = %e, "Translation request failed");
        }
    })
}

/// Request translations for every row of a reservation that lacks one.
///
/// Runs in the background, one request at a time.
pub fn translate_pending<B: ChatBackend + ?Sized>(
    backend: Arc<B>,
    reservation: ReservationNumber,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pending = match backend.fetch_untranslated(&reservation).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(reservation = %reservation, error = %e, "Could not list untranslated messages");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }

        info!(reservation = %reservation, count = pending.len(), "Requesting pending translations");
        for record in pending {
            if let Err(e) = backend.invoke_translation(&record).await {
                warn!(id = %record.id, error = %e, "Translation request failed");
            }
        }
    })
}
