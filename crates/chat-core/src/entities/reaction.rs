//! Reaction entities - reaction events, stored records, and tally snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Message;
use crate::error::DomainError;
use crate::value_objects::{Jid, MessageId};

/// A validated reaction: a record whose `reacts_to` points at a target message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub msgid: MessageId,
    pub from: Jid,
    pub jid: Jid,
    /// Emoji or label text
    pub label: String,
    pub reacts_to: MessageId,
    pub time: DateTime<Utc>,
}

impl ReactionEvent {
    /// Create a new ReactionEvent
    pub fn new(
        msgid: impl Into<MessageId>,
        from: impl Into<Jid>,
        label: impl Into<String>,
        reacts_to: impl Into<MessageId>,
    ) -> Self {
        let from = from.into();
        Self {
            msgid: msgid.into(),
            jid: Jid::new(from.bare()),
            from,
            label: label.into(),
            reacts_to: reacts_to.into(),
            time: Utc::now(),
        }
    }

    /// Check if the reaction uses a specific label
    #[inline]
    pub fn is_label(&self, label: &str) -> bool {
        self.label == label
    }
}

impl TryFrom<&Message> for ReactionEvent {
    type Error = DomainError;

    fn try_from(message: &Message) -> Result<Self, Self::Error> {
        let reacts_to = message
            .reacts_to
            .as_ref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DomainError::MissingReactsTo(message.msgid.clone()))?;
        if message.msgid.is_empty() {
            return Err(DomainError::MissingMessageId);
        }
        let label = message
            .text()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| DomainError::EmptyReactionLabel(message.msgid.clone()))?;

        Ok(Self {
            msgid: message.msgid.clone(),
            from: message.from.clone(),
            jid: message.jid.clone(),
            label: label.to_string(),
            reacts_to: reacts_to.clone(),
            time: message.time,
        })
    }
}

/// A reaction as remembered by the reaction store
///
/// `rendered` and `removed` are never both set once a reconciliation settles;
/// `removed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionRecord {
    pub event: ReactionEvent,
    pub rendered: bool,
    pub removed: bool,
}

impl ReactionRecord {
    /// Create an unresolved record
    pub fn new(event: ReactionEvent) -> Self {
        Self {
            event,
            rendered: false,
            removed: false,
        }
    }

    #[inline]
    pub fn msgid(&self) -> &MessageId {
        &self.event.msgid
    }

    #[inline]
    pub fn reacts_to(&self) -> &MessageId {
        &self.event.reacts_to
    }

    /// Neither drawn nor retracted yet
    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.rendered && !self.removed
    }

    /// Already drawn or retracted; replays of it are ignored
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.rendered || self.removed
    }
}

/// Aggregated reaction badge for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeSnapshot {
    pub label: String,
    pub count: usize,
    /// Contributing users, in the order they reacted
    pub users: Vec<Jid>,
    /// Reaction records currently drawn into this badge
    pub reaction_ids: Vec<MessageId>,
}

impl BadgeSnapshot {
    /// Check if a user contributes to this badge
    pub fn has_user(&self, user: &Jid) -> bool {
        self.users.contains(user)
    }
}
