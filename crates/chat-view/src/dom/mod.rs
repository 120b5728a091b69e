//! In-memory message tree
//!
//! Fragments rendered by the message views, the reaction containers beside
//! them, and the renderer that applies badge operations.

mod badge;
mod document;
mod fragment;
mod renderer;

pub use badge::{Badge, Contributor, ReactionContainer};
pub use document::{Attach, Document, MessageNode, FADE_OUT_CLASS};
pub use fragment::{Fragment, FragmentKind};
pub use renderer::DomReactionRenderer;
