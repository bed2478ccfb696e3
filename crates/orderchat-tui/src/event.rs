//! Event types for communication between the backend thread and the UI.

use orderchat_core::{ChangeEvent, ChatMessage, ReservationNumber, UserId};
use orderchat_panel::SendRequest;

/// State of the realtime change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Connecting,
    Live,
    /// Never connected, or the connection dropped. Not retried.
    Offline,
}

/// Events sent from the backend thread to the UI thread.
#[derive(Debug)]
pub enum UiEvent {
    /// The session's user id, once the backend has looked it up.
    ViewerResolved(UserId),

    /// Initial fetch finished.
    Loaded {
        reservation: ReservationNumber,
        rows: Vec<ChatMessage>,
    },

    /// Initial fetch failed.
    LoadFailed {
        reservation: ReservationNumber,
        reason: String,
    },

    /// A row changed on the service.
    Change {
        reservation: ReservationNumber,
        event: ChangeEvent,
    },

    /// Outcome of a send: the stored row, or the service's reason.
    SendCompleted(Result<ChatMessage, String>),

    Feed(FeedStatus),

    /// Something worth showing in the footer.
    Error(String),
}

/// Commands sent from the UI thread to the backend thread.
#[derive(Debug)]
pub enum BackendCommand {
    /// Show a reservation (replaces the current one).
    Open(ReservationNumber),

    /// Deliver an admitted send.
    Send(SendRequest),

    Quit,
}
