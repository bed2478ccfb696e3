//! Ordered message log and change-feed reconciliation.
//!
//! The log for a reservation is append-only from the client's point of
//! view. Rows arrive from three places: the initial fetch, the row the
//! service hands back after a local insert, and the change feed. All of
//! them funnel through [`MessageLog::apply`], which is idempotent by
//! message id, so the same row showing up twice never duplicates.

use crate::ids::MessageId;
use crate::message::ChatMessage;

/// A row change pushed by the data service.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A new row was committed.
    Insert(ChatMessage),
    /// An existing row changed (translation arrival).
    Update(ChatMessage),
}

impl ChangeEvent {
    /// The row carried by the event.
    pub fn record(&self) -> &ChatMessage {
        match self {
            ChangeEvent::Insert(msg) | ChangeEvent::Update(msg) => msg,
        }
    }

    /// Consume the event and return its row.
    pub fn into_record(self) -> ChatMessage {
        match self {
            ChangeEvent::Insert(msg) | ChangeEvent::Update(msg) => msg,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Insert(_) => "insert",
            ChangeEvent::Update(_) => "update",
        }
    }
}

/// What applying a row or event did to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Row was new and went to the end of the log.
    Appended,
    /// Row replaced an existing entry with the same id.
    Replaced,
    /// Row was already present; nothing changed.
    Duplicate,
    /// An update arrived for an id the log had not seen yet; the row
    /// was placed by `created_at` instead of being dropped.
    Adopted,
}

impl Applied {
    /// Whether the visible log changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Duplicate)
    }
}

/// Ordered chat log for one reservation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with a fetch result, keeping its order.
    pub fn replace(&mut self, rows: Vec<ChatMessage>) {
        self.messages = rows;
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Append a row unless one with the same id is already present.
    pub fn append(&mut self, msg: ChatMessage) -> Applied {
        if self.position(&msg.id).is_some() {
            return Applied::Duplicate;
        }
        self.messages.push(msg);
        Applied::Appended
    }

    /// Apply a change-feed event.
    pub fn apply(&mut self, event: ChangeEvent) -> Applied {
        match event {
            ChangeEvent::Insert(msg) => self.append(msg),
            ChangeEvent::Update(msg) => match self.position(&msg.id) {
                Some(idx) => {
                    if self.messages[idx] == msg {
                        Applied::Duplicate
                    } else {
                        self.messages[idx] = msg;
                        Applied::Replaced
                    }
                }
                None => {
                    let idx = self
                        .messages
                        .partition_point(|m| m.created_at <= msg.created_at);
                    self.messages.insert(idx, msg);
                    Applied::Adopted
                }
            },
        }
    }

    /// Look up a row by id.
    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rows in display order.
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Iterate rows in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}
