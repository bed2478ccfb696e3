//! Cancellable change-feed handle.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use orderchat_core::{ChangeEvent, ReservationNumber};

use crate::error::ClientError;

/// Receiving end of a change feed for one reservation.
///
/// Closing or dropping the handle cancels the task feeding it.
pub struct Subscription {
    reservation: ReservationNumber,
    events: mpsc::Receiver<ChangeEvent>,
    cancel: CancellationToken,
}

/// Producing end held by the transport task.
#[derive(Clone)]
pub struct SubscriptionSink {
    tx: mpsc::Sender<ChangeEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Create a connected handle/sink pair.
    pub fn channel(reservation: ReservationNumber, buffer: usize) -> (Self, SubscriptionSink) {
        let (tx, events) = mpsc::channel(buffer);
        let cancel = CancellationToken::new();
        (
            Self {
                reservation,
                events,
                cancel: cancel.clone(),
            },
            SubscriptionSink { tx, cancel },
        )
    }

    /// Reservation this feed is filtered to.
    pub fn reservation(&self) -> &ReservationNumber {
        &self.reservation
    }

    /// Wait for the next event. `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Take a buffered event without waiting.
    ///
    /// Returns `Ok(None)` when nothing is buffered and
    /// `Err(ClientError::ChannelClosed)` once the feed has ended.
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, ClientError> {
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ClientError::ChannelClosed),
        }
    }

    /// Stop the feed. Buffered events are discarded.
    pub fn close(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!(reservation = %self.reservation, "Closing change feed");
        }
        self.cancel.cancel();
        self.events.close();
    }

    /// Whether `close` has been called (or the handle is being dropped).
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl SubscriptionSink {
    /// Forward an event. Returns false once the receiver is gone.
    pub async fn send(&self, event: ChangeEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(event).await.is_ok()
    }

    /// Resolves when the handle has been closed or dropped.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Whether the handle has been closed or dropped.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
