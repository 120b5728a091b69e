//! Message lifecycle events

mod domain_event;

pub use domain_event::{
    MessageAddedEvent, MessageChangedEvent, MessageDestroyedEvent, MessageEvent,
};
