//! Reaction reconciler
//!
//! Decides what one reaction event does to the tally of its target message.
//! The decision is computed against a read-only view of the tree and the
//! store; nothing is mutated here.
//!
//! Rules, first match wins:
//! 1. a badge already lists this reaction id: duplicate
//! 2. the record was already drawn or retracted: stale replay
//! 3. the target has no reaction container yet: defer
//! 4. the sender already holds this label: toggle it off
//! 5. otherwise drop the sender's other labels and add this one

use chat_core::{Jid, MessageId, ReactionEvent};
use serde::Serialize;

use super::store::ReactionStore;

/// A label a user currently contributes to, and the reaction that drew it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldReaction {
    pub label: String,
    pub reaction: MessageId,
}

/// Read access to the rendered reaction state
pub trait ReactionTree {
    /// Some badge already lists this reaction id
    fn is_applied(&self, reaction: &MessageId) -> bool;

    /// The target message is attached and can hold badges
    fn has_container(&self, target: &MessageId) -> bool;

    /// Labels `user` contributes to under `target`
    fn contributions(&self, target: &MessageId, user: &Jid) -> Vec<HeldReaction>;
}

/// One mutation of a target's badges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeOp {
    /// Remove `user` from the `label` badge, destroying it when emptied
    Retract {
        target: MessageId,
        label: String,
        user: Jid,
    },
    /// Add `user` to the `label` badge, creating it if needed
    Contribute {
        target: MessageId,
        label: String,
        user: Jid,
        reaction: MessageId,
    },
}

/// What reconciling one event amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Already drawn
    Duplicate,
    /// Record already settled; replay ignored
    Stale,
    /// Target not renderable yet
    Deferred,
    /// The sender's identical earlier reaction was cancelled
    Retracted,
    /// Drawn; `displaced` counts the sender's other labels that were dropped
    Applied { displaced: usize },
    /// Target message was destroyed; event dropped
    Orphaned,
}

impl ReconcileOutcome {
    /// The event no longer needs a retry
    #[inline]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Deferred)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Stale => "stale",
            Self::Deferred => "deferred",
            Self::Retracted => "retracted",
            Self::Applied { .. } => "applied",
            Self::Orphaned => "orphaned",
        }
    }
}

/// Tally delta plus the store flags to settle afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionPlan {
    pub outcome: ReconcileOutcome,
    pub ops: Vec<BadgeOp>,
    /// Record to flag as drawn
    pub rendered: Option<MessageId>,
    /// Records to flag as retracted
    pub removed: Vec<MessageId>,
}

impl ReactionPlan {
    fn without_ops(outcome: ReconcileOutcome) -> Self {
        Self {
            outcome,
            ops: Vec::new(),
            rendered: None,
            removed: Vec::new(),
        }
    }
}

/// Stateless reconciliation rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionReconciler;

impl ReactionReconciler {
    pub fn plan<T>(tree: &T, store: &ReactionStore, event: &ReactionEvent) -> ReactionPlan
    where
        T: ReactionTree + ?Sized,
    {
        if tree.is_applied(&event.msgid) {
            // Self-heal a record that lost its flag while its badge survived
            let mut plan = ReactionPlan::without_ops(ReconcileOutcome::Duplicate);
            if store.find(&event.msgid).is_some_and(|r| r.is_pending()) {
                plan.rendered = Some(event.msgid.clone());
            }
            return plan;
        }

        if store.find(&event.msgid).is_some_and(|r| r.is_settled()) {
            return ReactionPlan::without_ops(ReconcileOutcome::Stale);
        }

        let target = &event.reacts_to;
        if !tree.has_container(target) {
            return ReactionPlan::without_ops(ReconcileOutcome::Deferred);
        }

        let held = tree.contributions(target, &event.from);

        if let Some(same) = held.iter().find(|h| event.is_label(&h.label)) {
            return ReactionPlan {
                outcome: ReconcileOutcome::Retracted,
                ops: vec![BadgeOp::Retract {
                    target: target.clone(),
                    label: same.label.clone(),
                    user: event.from.clone(),
                }],
                rendered: None,
                removed: vec![same.reaction.clone(), event.msgid.clone()],
            };
        }

        let mut ops = Vec::with_capacity(held.len() + 1);
        let mut removed = Vec::with_capacity(held.len());
        for other in &held {
            ops.push(BadgeOp::Retract {
                target: target.clone(),
                label: other.label.clone(),
                user: event.from.clone(),
            });
            removed.push(other.reaction.clone());
        }
        ops.push(BadgeOp::Contribute {
            target: target.clone(),
            label: event.label.clone(),
            user: event.from.clone(),
            reaction: event.msgid.clone(),
        });

        ReactionPlan {
            outcome: ReconcileOutcome::Applied {
                displaced: held.len(),
            },
            ops,
            rendered: Some(event.msgid.clone()),
            removed,
        }
    }
}
