//! # chat-core
//!
//! Domain layer containing message records, reaction entities, value objects,
//! lifecycle events, and extension-point traits.
//! This crate has zero dependencies on rendering or runtime concerns.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    BadgeSnapshot, ChatState, FileUpload, Message, MessageType, Occupant, ReactionEvent,
    ReactionRecord, Reference, Sender, ME_COMMAND,
};
pub use error::DomainError;
pub use events::{MessageAddedEvent, MessageChangedEvent, MessageDestroyedEvent, MessageEvent};
pub use traits::BodyHook;
pub use value_objects::{ChangedFields, Jid, MessageId};
