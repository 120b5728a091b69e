//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::MessageId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Malformed Records
    // =========================================================================
    #[error("Message has no msgid")]
    MissingMessageId,

    #[error("Reaction {0} does not reference a target message")]
    MissingReactsTo(MessageId),

    #[error("Reaction {0} has an empty label")]
    EmptyReactionLabel(MessageId),

    #[error("File upload {0} has no file data")]
    MissingFileData(MessageId),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message was destroyed: {0}")]
    MessageDestroyed(MessageId),

    // =========================================================================
    // Wrapped
    // =========================================================================
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingMessageId => "MISSING_MSGID",
            Self::MissingReactsTo(_) => "MISSING_REACTS_TO",
            Self::EmptyReactionLabel(_) => "EMPTY_REACTION_LABEL",
            Self::MissingFileData(_) => "MISSING_FILE_DATA",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::MessageDestroyed(_) => "MESSAGE_DESTROYED",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if the record itself is malformed (as opposed to missing)
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MissingMessageId
                | Self::MissingReactsTo(_)
                | Self::EmptyReactionLabel(_)
                | Self::MissingFileData(_)
        )
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MessageNotFound(_) | Self::MessageDestroyed(_))
    }
}
