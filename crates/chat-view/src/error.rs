//! View layer error types

use chat_core::{DomainError, MessageId};

/// Errors raised while rendering or mutating the message list
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("No view for message {0}")]
    UnknownMessage(MessageId),

    #[error("Retry of {msgid} failed: {reason}")]
    Retry { msgid: MessageId, reason: String },
}

impl ViewError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::UnknownMessage(_) => "UNKNOWN_VIEW",
            Self::Retry { .. } => "RETRY_FAILED",
        }
    }

    /// The record itself is unusable; skip it rather than abort
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_malformed())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_not_found(),
            Self::UnknownMessage(_) => true,
            Self::Retry { .. } => false,
        }
    }
}

impl From<ViewError> for chat_common::AppError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Domain(e) => Self::Domain(e),
            ViewError::UnknownMessage(msgid) => Self::not_found(format!("message {msgid}")),
            other @ ViewError::Retry { .. } => Self::internal(other),
        }
    }
}

pub type ViewResult<T> = Result<T, ViewError>;
