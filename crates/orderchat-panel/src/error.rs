//! Panel errors.

use thiserror::Error;

use orderchat_client::ClientError;

/// Why a send was refused before anything went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    /// No reservation is open.
    #[error("no conversation is open")]
    NoConversation,

    /// The conversation is still loading.
    #[error("conversation is still loading")]
    NotReady,

    /// Another send has not finished yet.
    #[error("a message is already being sent")]
    InFlight,

    /// Draft is empty or whitespace only.
    #[error("message is empty")]
    Empty,
}

/// Errors returned by panel operations.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Send refused by the guard.
    #[error(transparent)]
    Rejected(#[from] SendRejected),

    /// The service did not store the message.
    #[error("message was not delivered: {0}")]
    Delivery(#[source] ClientError),
}
