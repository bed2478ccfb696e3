//! Single-task chat panel.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use orderchat_client::{ChatBackend, Subscription};
use orderchat_core::{
    Applied, ChangeEvent, ChatMessage, RenderedMessage, ReservationNumber, UserId, Viewer,
};

use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::ops;
use crate::state::PanelState;

/// A chat panel mounted on one reservation at a time.
///
/// Owns the change feed of the open reservation. Dropping the panel or
/// opening another reservation closes it.
pub struct ChatPanel<B: ChatBackend + ?Sized> {
    backend: Arc<B>,
    viewer: Viewer,
    viewer_id: UserId,
    config: PanelConfig,
    state: PanelState,
    feed: Option<Subscription>,
}

impl<B: ChatBackend + ?Sized> ChatPanel<B> {
    pub fn new(backend: Arc<B>, viewer: Viewer, config: PanelConfig) -> Self {
        let viewer_id = viewer.id();
        Self {
            backend,
            viewer,
            viewer_id,
            config,
            state: PanelState::new(),
            feed: None,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    pub fn viewer_id(&self) -> &UserId {
        &self.viewer_id
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.set_draft(text);
    }

    /// Whether a change feed is attached.
    pub fn is_live(&self) -> bool {
        self.feed.as_ref().is_some_and(|feed| !feed.is_closed())
    }

    /// The log as the viewer sees it.
    pub fn rendered(&self) -> Vec<RenderedMessage> {
        self.state.rendered(&self.viewer_id)
    }

    /// Show a reservation: subscribe, fetch, then apply whatever arrived
    /// on the feed in between.
    pub async fn open(&mut self, reservation: ReservationNumber) {
        self.close_feed();
        self.state.open(reservation.clone());
        self.resolve_session().await;

        // Subscribe first so nothing written during the fetch is lost.
        self.feed = match self.backend.subscribe(&reservation).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!(reservation = %reservation, error = %e, "Change feed unavailable");
                None
            }
        };

        match ops::fetch_conversation(self.backend.as_ref(), &reservation).await {
            Ok(rows) => {
                let count = rows.len();
                if self.state.load_completed(&reservation, rows) {
                    info!(reservation = %reservation, count, "Conversation loaded");
                }
            }
            Err(e) => {
                self.state.load_failed(&reservation, &e.to_string());
            }
        }

        self.drain_feed();

        if self.config.translate_pending_on_load {
            ops::translate_pending(self.backend.clone(), reservation);
        }
    }

    /// Look up the session once if the viewer came without one, so that
    /// alignment and sent rows use the same id.
    async fn resolve_session(&mut self) {
        if self.viewer.session.is_some() {
            return;
        }
        match self.backend.current_user().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Session found");
                self.viewer_id = user.id.clone();
                self.viewer.session = Some(user);
            }
            Ok(None) => debug!("No session, using caller identity"),
            Err(e) => warn!(error = %e, "Could not read current session"),
        }
    }

    /// Stop showing the current reservation.
    pub fn close(&mut self) {
        self.close_feed();
        self.state.close();
    }

    fn close_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
    }

    /// Send the current draft.
    ///
    /// On success the stored row is in the log before this returns and a
    /// translation has been requested for it.
    pub async fn send(&mut self) -> Result<ChatMessage, PanelError> {
        let request = self.state.begin_send()?;

        match ops::deliver(self.backend.as_ref(), &self.viewer, &self.config, &request).await {
            Ok(stored) => {
                self.state.send_succeeded(stored.clone());
                ops::request_translation(self.backend.clone(), stored.clone());
                Ok(stored)
            }
            Err(e) => {
                error!(reservation = %request.reservation, error = %e, "Failed to send message");
                self.state.send_failed(e.to_string());
                Err(PanelError::Delivery(e))
            }
        }
    }

    /// Apply every change event already waiting on the feed.
    ///
    /// Returns how many of them changed the log.
    pub fn drain_feed(&mut self) -> usize {
        let mut changed = 0;
        loop {
            let next = match self.feed.as_mut() {
                Some(feed) => feed.try_recv(),
                None => return changed,
            };
            match next {
                Ok(Some(event)) => {
                    if self.apply(event).is_some_and(|applied| applied.changed()) {
                        changed += 1;
                    }
                }
                Ok(None) => return changed,
                Err(e) => {
                    warn!(error = %e, "Change feed ended");
                    self.feed = None;
                    return changed;
                }
            }
        }
    }

    /// Wait for the next change event and apply it.
    ///
    /// Returns `None` when there is no feed or it has shut down.
    pub async fn next_change(&mut self) -> Option<Applied> {
        let feed = self.feed.as_mut()?;
        match feed.recv().await {
            Some(event) => self.apply(event),
            None => {
                warn!("Change feed ended");
                self.feed = None;
                None
            }
        }
    }

    fn apply(&mut self, event: ChangeEvent) -> Option<Applied> {
        let reservation = event.record().reservation_number.clone();
        // Someone else's untranslated message: nudge the translation function.
        let untranslated = match &event {
            ChangeEvent::Insert(record)
                if record.sender_id.as_ref() != Some(&self.viewer_id)
                    && record.needs_translation() =>
            {
                Some(record.clone())
            }
            _ => None,
        };

        let applied = self.state.apply_change(&reservation, event)?;
        if let (Some(record), true) = (untranslated, applied.changed()) {
            ops::request_translation(self.backend.clone(), record);
        }
        Some(applied)
    }
}

impl<B: ChatBackend + ?Sized> Drop for ChatPanel<B> {
    fn drop(&mut self) {
        self.close_feed();
    }
}
