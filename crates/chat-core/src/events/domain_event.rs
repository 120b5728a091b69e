//! Message lifecycle events - the change-notification stream the view consumes
//!
//! The messaging layer emits one event per record mutation. Events are
//! delivered in order but may reference records (reaction targets) that have
//! not arrived yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Message;
use crate::value_objects::{ChangedFields, MessageId};

/// All message lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageEvent {
    MessageAdded(MessageAddedEvent),
    MessageChanged(MessageChangedEvent),
    MessageDestroyed(MessageDestroyedEvent),
}

impl MessageEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageAdded(_) => "MESSAGE_ADDED",
            Self::MessageChanged(_) => "MESSAGE_CHANGED",
            Self::MessageDestroyed(_) => "MESSAGE_DESTROYED",
        }
    }

    /// Get the id of the record the event is about
    pub fn msgid(&self) -> &MessageId {
        match self {
            Self::MessageAdded(e) => &e.message.msgid,
            Self::MessageChanged(e) => &e.message.msgid,
            Self::MessageDestroyed(e) => &e.msgid,
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessageAdded(e) => e.timestamp,
            Self::MessageChanged(e) => e.timestamp,
            Self::MessageDestroyed(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAddedEvent {
    pub message: Message,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl MessageAddedEvent {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
        }
    }
}

/// A record changed; `message` is the record after the change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageChangedEvent {
    pub message: Message,
    #[serde(default)]
    pub changed: ChangedFields,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl MessageChangedEvent {
    pub fn new(message: Message, changed: ChangedFields) -> Self {
        Self {
            message,
            changed,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDestroyedEvent {
    pub msgid: MessageId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl MessageDestroyedEvent {
    pub fn new(msgid: MessageId) -> Self {
        Self {
            msgid,
            timestamp: Utc::now(),
        }
    }
}
