//! Message views
//!
//! Classification of records into render paths, the templates for each path,
//! the body transform pipeline, and the [`ChatView`] that owns them all.

mod chat_view;
mod kind;
pub mod media;
mod message_view;
pub mod templates;
mod transform;

pub use chat_view::{ChatView, TOMBSTONE_CAPACITY};
pub use kind::MessageKind;
pub use message_view::{ChangeAction, MessageView, RenderContext, RenderScope, Rendered};
pub use transform::BodyTransformer;
