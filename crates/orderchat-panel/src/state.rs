//! Panel state machine.
//!
//! `Idle → Loading → Ready`, re-entering `Loading` whenever the
//! reservation changes. `Ready` carries an orthogonal sending flag that
//! admits one send at a time. Nothing here performs I/O; callers feed in
//! fetch results, change events and send outcomes.

use tracing::{debug, warn};

use orderchat_core::{
    render_log, Applied, ChangeEvent, ChatMessage, MessageLog, RenderedMessage, ReservationNumber,
    UserId,
};

use crate::error::SendRejected;

/// Lifecycle phase of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPhase {
    /// No reservation open.
    #[default]
    Idle,
    /// Waiting for the initial fetch.
    Loading,
    /// Log is live.
    Ready,
}

/// A send admitted by the guard, ready to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub reservation: ReservationNumber,
    pub text: String,
}

/// State of one mounted chat panel.
#[derive(Debug, Default)]
pub struct PanelState {
    reservation: Option<ReservationNumber>,
    phase: PanelPhase,
    log: MessageLog,
    draft: String,
    sending: bool,
    /// Lines scrolled up from the bottom; 0 keeps the newest message visible.
    scroll_back: usize,
    /// Change events that arrived before the initial fetch finished.
    buffered: Vec<ChangeEvent>,
    /// Blocking alert for the user (failed send).
    alert: Option<String>,
}

impl PanelState {
    /// Create an idle panel.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reservation(&self) -> Option<&ReservationNumber> {
        self.reservation.as_ref()
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Editable draft text.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PanelPhase::Loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Clear the blocking alert once the user has acknowledged it.
    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Scroll towards older messages.
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    /// Scroll towards newer messages.
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    fn is_current(&self, reservation: &ReservationNumber) -> bool {
        self.reservation.as_ref() == Some(reservation)
    }

    /// Start showing a reservation. The log is emptied until the fetch lands.
    pub fn open(&mut self, reservation: ReservationNumber) {
        debug!(reservation = %reservation, "Opening conversation");
        self.reservation = Some(reservation);
        self.phase = PanelPhase::Loading;
        self.log.clear();
        self.buffered.clear();
        self.scroll_to_bottom();
    }

    /// Return to `Idle`.
    pub fn close(&mut self) {
        self.reservation = None;
        self.phase = PanelPhase::Idle;
        self.log.clear();
        self.buffered.clear();
        self.scroll_to_bottom();
    }

    /// Install the initial fetch result.
    ///
    /// Returns false when the result belongs to a reservation that is no
    /// longer open.
    pub fn load_completed(
        &mut self,
        reservation: &ReservationNumber,
        rows: Vec<ChatMessage>,
    ) -> bool {
        if !self.is_current(reservation) || self.phase != PanelPhase::Loading {
            debug!(reservation = %reservation, "Discarding stale load result");
            return false;
        }

        self.log.replace(rows);
        self.phase = PanelPhase::Ready;
        for event in std::mem::take(&mut self.buffered) {
            self.log.apply(event);
        }
        self.scroll_to_bottom();
        true
    }

    /// The initial fetch failed: show an empty conversation.
    pub fn load_failed(&mut self, reservation: &ReservationNumber, reason: &str) -> bool {
        if !self.is_current(reservation) || self.phase != PanelPhase::Loading {
            return false;
        }

        warn!(reservation = %reservation, error = %reason, "Failed to load messages");
        self.load_completed(reservation, Vec::new())
    }

    /// Apply a change event from the feed of `reservation`.
    ///
    /// Events are buffered while loading and ignored for other reservations.
    pub fn apply_change(
        &mut self,
        reservation: &ReservationNumber,
        event: ChangeEvent,
    ) -> Option<Applied> {
        if !self.is_current(reservation) {
            return None;
        }

        match self.phase {
            PanelPhase::Idle => None,
            PanelPhase::Loading => {
                self.buffered.push(event);
                None
            }
            PanelPhase::Ready => {
                let id = event.record().id.clone();
                let kind = event.kind();
                let applied = self.log.apply(event);
                if applied == Applied::Adopted {
                    warn!(id = %id, "Update arrived for a message not yet in the log");
                }
                debug!(id = %id, kind, ?applied, "Applied change event");
                if applied.changed() {
                    self.scroll_to_bottom();
                }
                Some(applied)
            }
        }
    }

    /// Admit a send. On success the draft is cleared and the sending flag set.
    pub fn begin_send(&mut self) -> Result<SendRequest, SendRejected> {
        let reservation = match (&self.reservation, self.phase) {
            (None, _) | (_, PanelPhase::Idle) => return Err(SendRejected::NoConversation),
            (_, PanelPhase::Loading) => return Err(SendRejected::NotReady),
            (Some(reservation), PanelPhase::Ready) => reservation.clone(),
        };
        if self.sending {
            return Err(SendRejected::InFlight);
        }

        if self.draft.trim().is_empty() {
            return Err(SendRejected::Empty);
        }

        let request = SendRequest {
            reservation,
            text: std::mem::take(&mut self.draft),
        };
        self.sending = true;
        Ok(request)
    }

    /// The service stored the message: show it right away.
    pub fn send_succeeded(&mut self, row: ChatMessage) -> Applied {
        self.sending = false;
        if !self.is_current(&row.reservation_number) || self.phase != PanelPhase::Ready {
            return Applied::Duplicate;
        }

        let applied = self.log.append(row);
        if applied.changed() {
            self.scroll_to_bottom();
        }
        applied
    }

    /// The service refused the message: raise a blocking alert.
    ///
    /// The draft is not restored.
    pub fn send_failed(&mut self, reason: impl Into<String>) {
        self.sending = false;
        self.alert = Some(reason.into());
    }

    /// The log as the viewer sees it.
    pub fn rendered(&self, viewer_id: &UserId) -> Vec<RenderedMessage> {
        render_log(&self.log, viewer_id)
    }
}
