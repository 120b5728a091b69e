//! Applies badge operations to the document
//!
//! Every operation checks the tree before mutating it. An operation that no
//! longer fits the tree is logged and skipped, so replaying a batch is
//! harmless.

use tracing::{debug, warn};

use super::document::Document;
use crate::reactions::{BadgeOp, ReactionTree};

/// Draws reconciliation decisions into a [`Document`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DomReactionRenderer;

impl DomReactionRenderer {
    /// Apply `ops` in order, returning how many changed the tree
    pub fn apply(doc: &mut Document, ops: &[BadgeOp]) -> usize {
        ops.iter().filter(|op| Self::apply_one(doc, op)).count()
    }

    fn apply_one(doc: &mut Document, op: &BadgeOp) -> bool {
        match op {
            BadgeOp::Contribute {
                target,
                label,
                user,
                reaction,
            } => {
                if doc.is_applied(reaction) {
                    debug!(reaction = %reaction, "Reaction already drawn");
                    return false;
                }
                let Some(container) = doc.container_mut(target) else {
                    warn!(reacts_to = %target, reaction = %reaction, "No reaction container for target");
                    return false;
                };
                if !container.contribute(label, user, reaction) {
                    warn!(
                        reacts_to = %target,
                        label = %label,
                        user = %user,
                        "User already listed on badge"
                    );
                    return false;
                }
                doc.index_reaction(reaction.clone(), target.clone());
                true
            }
            BadgeOp::Retract {
                target,
                label,
                user,
            } => {
                let Some(container) = doc.container_mut(target) else {
                    warn!(reacts_to = %target, label = %label, "No reaction container for target");
                    return false;
                };
                let Some(reaction) = container.retract(label, user) else {
                    warn!(
                        reacts_to = %target,
                        label = %label,
                        user = %user,
                        "User not listed on badge"
                    );
                    return false;
                };
                doc.unindex_reaction(&reaction);
                true
            }
        }
    }
}
