//! Message kinds - which render path a record takes

use chat_core::{ChatState, Message, MessageType, ReactionEvent};
use tracing::warn;

/// Render path for one message record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Typing indicator with nothing else to show
    ChatState(ChatState),
    /// Upload still in progress
    FileUpload,
    Error,
    Info,
    Reaction(ReactionEvent),
    Chat,
}

impl MessageKind {
    /// Classify a record, first match wins
    ///
    /// A record that references another message but is not a valid reaction
    /// falls back to an ordinary chat message.
    pub fn classify(message: &Message) -> Self {
        if let Some(state) = message
            .chat_state
            .filter(|_| message.is_only_chat_state_notification())
        {
            return Self::ChatState(state);
        }
        if message.is_file_upload() {
            return Self::FileUpload;
        }
        match message.msg_type {
            MessageType::Error => return Self::Error,
            MessageType::Info => return Self::Info,
            _ => {}
        }
        if message.is_reaction() {
            match ReactionEvent::try_from(message) {
                Ok(event) => return Self::Reaction(event),
                Err(e) => {
                    warn!(msgid = %message.msgid, error = %e, "Malformed reaction, rendering as message");
                }
            }
        }
        Self::Chat
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatState(_) => "chat_state",
            Self::FileUpload => "file_upload",
            Self::Error => "error",
            Self::Info => "info",
            Self::Reaction(_) => "reaction",
            Self::Chat => "chat",
        }
    }
}
