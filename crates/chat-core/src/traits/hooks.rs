//! Extension points (ports) for the message body transform pipeline
//!
//! Plugins register hooks that see the raw body before the built-in
//! transformations run and the finished markup afterwards.

use async_trait::async_trait;

use crate::entities::Message;

/// Hook invoked around body text transformation
///
/// Both methods default to passing the text through unchanged.
#[async_trait]
pub trait BodyHook: Send + Sync {
    /// Called with the raw body text before any built-in transformation
    async fn before_transform(&self, _message: &Message, text: String) -> String {
        text
    }

    /// Called with the finished, already sanitized markup
    async fn after_transform(&self, _message: &Message, html: String) -> String {
        html
    }
}
