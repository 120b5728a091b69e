//! Domain entities - message records and reactions

mod message;
mod reaction;

pub use message::{
    ChatState, FileUpload, Message, MessageType, Occupant, Reference, Sender, ME_COMMAND,
};
pub use reaction::{BadgeSnapshot, ReactionEvent, ReactionRecord};
