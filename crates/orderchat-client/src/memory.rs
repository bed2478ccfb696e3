//! In-process data service.
//!
//! Behaves like the hosted service from the panel's point of view: rows
//! get ids and timestamps on insert, every insert/update is pushed to
//! matching subscriptions, and the translation function updates the row
//! it was given. Used by tests (call counts, failure injection) and by
//! the terminal app's demo mode.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use orderchat_core::{
    AuthUser, ChangeEvent, ChatMessage, Language, MessageId, NewChatMessage, ReservationNumber,
    UserId, UserProfile,
};

use crate::backend::ChatBackend;
use crate::error::ClientError;
use crate::subscription::Subscription;

/// Produces a translation for a stored row.
pub type Translator = Arc<dyn Fn(&ChatMessage) -> String + Send + Sync>;

/// How many times each operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch: usize,
    pub fetch_untranslated: usize,
    pub insert: usize,
    pub subscribe: usize,
    pub translate: usize,
    pub current_user: usize,
    pub profile: usize,
}

#[derive(Default)]
struct Failures {
    fetch: Option<String>,
    insert: Option<String>,
    translate: Option<String>,
    subscribe: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    rows: Vec<ChatMessage>,
    session: Option<AuthUser>,
    profiles: HashMap<UserId, UserProfile>,
    failures: Failures,
    calls: CallCounts,
    translator: Option<Translator>,
}

fn service_error(message: &str) -> ClientError {
    ClientError::Service {
        status: 500,
        message: message.to_string(),
    }
}

/// In-memory [`ChatBackend`].
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    changes: broadcast::Sender<ChangeEvent>,
    event_buffer: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty service with no session.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(1024);
        Self {
            state: Mutex::new(MemoryState::default()),
            changes,
            event_buffer: 256,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the authenticated session.
    pub fn with_session(self, user: AuthUser) -> Self {
        self.state().session = Some(user);
        self
    }

    /// Register a profile row.
    pub fn with_profile(self, user_id: UserId, profile: UserProfile) -> Self {
        self.state().profiles.insert(user_id, profile);
        self
    }

    /// Translate rows whenever the translation function is invoked.
    pub fn with_translator(self, translator: Translator) -> Self {
        self.state().translator = Some(translator);
        self
    }

    /// Store rows as if they had been written earlier. No events are sent.
    pub fn seed(&self, rows: impl IntoIterator<Item = ChatMessage>) {
        self.state().rows.extend(rows);
    }

    /// Make `fetch_messages` fail with the given reason.
    pub fn fail_fetch(&self, reason: impl Into<String>) {
        self.state().failures.fetch = Some(reason.into());
    }

    /// Make `insert_message` fail with the given reason.
    pub fn fail_insert(&self, reason: impl Into<String>) {
        self.state().failures.insert = Some(reason.into());
    }

    /// Make `invoke_translation` fail with the given reason.
    pub fn fail_translation(&self, reason: impl Into<String>) {
        self.state().failures.translate = Some(reason.into());
    }

    /// Make `subscribe` fail with the given reason.
    pub fn fail_subscribe(&self, reason: impl Into<String>) {
        self.state().failures.subscribe = Some(reason.into());
    }

    /// Remove every injected failure.
    pub fn clear_failures(&self) {
        self.state().failures = Failures::default();
    }

    /// Snapshot of the call counters.
    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    /// Stored rows of a reservation in insertion order.
    pub fn rows(&self, reservation: &ReservationNumber) -> Vec<ChatMessage> {
        self.state()
            .rows
            .iter()
            .filter(|m| &m.reservation_number == reservation)
            .cloned()
            .collect()
    }

    /// Store a message written by another client and publish the insert.
    pub fn insert_external(&self, message: NewChatMessage) -> ChatMessage {
        let stored = self.store(message);
        self.publish(ChangeEvent::Insert(stored.clone()));
        stored
    }

    /// Fill in a row's translation and publish the update.
    pub fn complete_translation(
        &self,
        id: &MessageId,
        text: impl Into<String>,
    ) -> Option<ChatMessage> {
        let updated = {
            let mut state = self.state();
            let row = state.rows.iter_mut().find(|m| &m.id == id)?;
            row.translated_message = Some(text.into());
            row.translated_language = Some(row.original_language.counterpart());
            row.clone()
        };
        self.publish(ChangeEvent::Update(updated.clone()));
        Some(updated)
    }

    fn store(&self, message: NewChatMessage) -> ChatMessage {
        let mut state = self.state();
        let now = Utc::now();
        // Keep created_at strictly increasing so ordering is deterministic.
        let created_at = match state.rows.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        };
        let stored = ChatMessage::from_new(message, MessageId::generate(), created_at);
        state.rows.push(stored.clone());
        stored
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is fine: nobody is subscribed yet.
        let _ = self.changes.send(event);
    }
}

#[async_trait]
impl ChatBackend for MemoryBackend {
    async fn fetch_messages(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let mut state = self.state();
        state.calls.fetch += 1;
        if let Some(reason) = &state.failures.fetch {
            return Err(service_error(reason));
        }

        let mut rows: Vec<ChatMessage> = state
            .rows
            .iter()
            .filter(|m| &m.reservation_number == reservation)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn fetch_untranslated(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let mut state = self.state();
        state.calls.fetch_untranslated += 1;
        if let Some(reason) = &state.failures.fetch {
            return Err(service_error(reason));
        }

        Ok(state
            .rows
            .iter()
            .filter(|m| &m.reservation_number == reservation && m.needs_translation())
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: &NewChatMessage) -> Result<ChatMessage, ClientError> {
        {
            let mut state = self.state();
            state.calls.insert += 1;
            if let Some(reason) = &state.failures.insert {
                return Err(service_error(reason));
            }
        }

        let stored = self.store(message.clone());
        debug!(id = %stored.id, reservation = %stored.reservation_number, "Stored message");
        self.publish(ChangeEvent::Insert(stored.clone()));
        Ok(stored)
    }

    async fn subscribe(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Subscription, ClientError> {
        {
            let mut state = self.state();
            state.calls.subscribe += 1;
            if let Some(reason) = &state.failures.subscribe {
                return Err(ClientError::Connection(reason.clone()));
            }
        }

        let mut changes = self.changes.subscribe();
        let (subscription, sink) = Subscription::channel(reservation.clone(), self.event_buffer);
        let reservation = reservation.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sink.cancelled() => break,
                    received = changes.recv() => match received {
                        Ok(event) if event.record().reservation_number == reservation => {
                            if !sink.send(event).await {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, reservation = %reservation, "Change feed lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(subscription)
    }

    async fn invoke_translation(&self, record: &ChatMessage) -> Result<(), ClientError> {
        let translator = {
            let mut state = self.state();
            state.calls.translate += 1;
            if let Some(reason) = &state.failures.translate {
                return Err(service_error(reason));
            }
            state.translator.clone()
        };

        if record.translated_message.is_some() {
            return Ok(());
        }
        if let Some(translate) = translator {
            let text = translate(record);
            self.complete_translation(&record.id, text);
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, ClientError> {
        let mut state = self.state();
        state.calls.current_user += 1;
        Ok(state.session.clone())
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ClientError> {
        let mut state = self.state();
        state.calls.profile += 1;
        Ok(state.profiles.get(user_id).cloned())
    }
}

/// Translator that tags the text with its target language.
pub fn tagging_translator() -> Translator {
    Arc::new(|record: &ChatMessage| match record.original_language {
        Language::Zh => format!("[ko] {}", record.original_message),
        Language::Ko => format!("[zh] {}", record.original_message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderchat_core::{MessageType, SenderRole};

    fn rn(value: &str) -> ReservationNumber {
        ReservationNumber::parse(value).unwrap()
    }

    fn new_message(reservation: &str, text: &str, lang: Language) -> NewChatMessage {
        NewChatMessage {
            reservation_number: rn(reservation),
            sender_id: UserId::new("u1"),
            sender_name: "Kim".to_string(),
            sender_role: SenderRole::Customer,
            original_message: text.to_string(),
            original_language: lang,
            message_type: MessageType::Text,
            service_type: Some("inspection".to_string()),
            is_read: false,
        }
    }

    #[tokio::test]
    async fn test_insert_publishes_to_matching_subscription_only() {
        let backend = MemoryBackend::new();
        let mut sub = backend.subscribe(&rn("DL-1")).await.unwrap();

        backend
            .insert_message(&new_message("DL-2", "다른 주문", Language::Ko))
            .await
            .unwrap();
        let stored = backend
            .insert_message(&new_message("DL-1", "안녕하세요", Language::Ko))
            .await
            .unwrap();

        let event = sub.recv().await.unwrap();
        assert_eq!(event, ChangeEvent::Insert(stored));
        assert!(sub.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_orders_by_created_at() {
        let backend = MemoryBackend::new();
        let first = backend
            .insert_message(&new_message("DL-1", "하나", Language::Ko))
            .await
            .unwrap();
        let second = backend
            .insert_message(&new_message("DL-1", "둘", Language::Ko))
            .await
            .unwrap();

        let rows = backend.fetch_messages(&rn("DL-1")).await.unwrap();
        assert_eq!(rows, vec![first.clone(), second.clone()]);
        assert!(first.created_at < second.created_at);
        assert_eq!(backend.calls().fetch, 1);
    }

    #[tokio::test]
    async fn test_translator_updates_row_and_publishes() {
        let backend = MemoryBackend::new().with_translator(tagging_translator());
        let stored = backend
            .insert_message(&new_message("DL-1", "您好", Language::Zh))
            .await
            .unwrap();

        let mut sub = backend.subscribe(&rn("DL-1")).await.unwrap();
        backend.invoke_translation(&stored).await.unwrap();

        match sub.recv().await.unwrap() {
            ChangeEvent::Update(row) => {
                assert_eq!(row.translated_message.as_deref(), Some("[ko] 您好"));
                assert_eq!(row.translated_language, Some(Language::Ko));
            }
            other => panic!("Expected update, got {:?}", other),
        }
        assert!(backend.fetch_untranslated(&rn("DL-1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = MemoryBackend::new();
        backend.fail_insert("permission denied for table chat_messages");

        let err = backend
            .insert_message(&new_message("DL-1", "안녕", Language::Ko))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table chat_messages");
        assert!(backend.rows(&rn("DL-1")).is_empty());

        backend.clear_failures();
        assert!(backend
            .insert_message(&new_message("DL-1", "안녕", Language::Ko))
            .await
            .is_ok());
        assert_eq!(backend.calls().insert, 2);
    }
}
