//! # chat-view
//!
//! Renders chat message records into an in-memory document and keeps a
//! per-message tally of reactions consistent across out-of-order arrival,
//! toggles and re-renders.

pub mod dom;
pub mod error;
pub mod reactions;
pub mod view;

// Re-export commonly used types at crate root
pub use dom::{Document, DomReactionRenderer, Fragment, FragmentKind};
pub use error::{ViewError, ViewResult};
pub use reactions::{
    render_reaction, BadgeOp, ReactionReconciler, ReactionStore, ReconcileOutcome,
    ReconciliationScheduler, Sweep, SweepReport,
};
pub use view::{BodyTransformer, ChatView, MessageKind, MessageView, TOMBSTONE_CAPACITY};
