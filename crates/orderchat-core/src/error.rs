//! Core domain errors.

use thiserror::Error;

/// Core domain errors for orderchat.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Reservation number was empty or blank.
    #[error("Reservation number must not be empty")]
    EmptyReservationNumber,

    /// Unknown language code.
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// Unknown message type.
    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
