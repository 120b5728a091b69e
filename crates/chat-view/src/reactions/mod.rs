//! Reaction aggregation
//!
//! [`render_reaction`] runs one event through the whole pipeline: remember it
//! in the [`ReactionStore`], plan the tally delta with the
//! [`ReactionReconciler`], draw it with the [`DomReactionRenderer`], then
//! settle the record flags.

mod reconciler;
mod scheduler;
mod store;

pub use reconciler::{
    BadgeOp, HeldReaction, ReactionPlan, ReactionReconciler, ReactionTree, ReconcileOutcome,
};
pub use scheduler::{ReconciliationScheduler, Sweep, SweepReport};
pub use store::ReactionStore;

use chat_core::{MessageId, ReactionEvent};
use tracing::{debug, instrument};

use crate::dom::{Document, DomReactionRenderer};

/// Reconcile one reaction event against the document
#[instrument(skip_all, fields(msgid = %event.msgid, reacts_to = %event.reacts_to))]
pub fn render_reaction(
    doc: &mut Document,
    store: &mut ReactionStore,
    event: &ReactionEvent,
) -> ReconcileOutcome {
    store.upsert(event.clone());

    let plan = ReactionReconciler::plan(doc, store, event);
    let changed = DomReactionRenderer::apply(doc, &plan.ops);
    settle(store, &plan);

    debug!(
        outcome = plan.outcome.as_str(),
        label = %event.label,
        from = %event.from,
        changed,
        "Reaction reconciled"
    );
    plan.outcome
}

fn settle(store: &mut ReactionStore, plan: &ReactionPlan) {
    for msgid in &plan.removed {
        store.mark_removed(msgid);
    }
    if let Some(msgid) = &plan.rendered {
        store.mark_rendered(msgid);
    }
}

/// Retry every pending reaction, in arrival order
pub fn sweep_pending(doc: &mut Document, store: &mut ReactionStore) -> SweepReport {
    let pending: Vec<ReactionEvent> = store.pending().map(|r| r.event.clone()).collect();
    retry(doc, store, pending)
}

/// Retry the pending reactions that target `target`
pub fn resolve_pending_for(
    doc: &mut Document,
    store: &mut ReactionStore,
    target: &MessageId,
) -> SweepReport {
    let pending: Vec<ReactionEvent> = store.pending_for(target).map(|r| r.event.clone()).collect();
    retry(doc, store, pending)
}

fn retry(doc: &mut Document, store: &mut ReactionStore, pending: Vec<ReactionEvent>) -> SweepReport {
    let mut report = SweepReport::default();
    for event in &pending {
        // An earlier event in this pass may have settled it already
        if store.find(&event.msgid).is_some_and(|r| r.is_settled()) {
            continue;
        }
        report.record(render_reaction(doc, store, event).is_resolved());
    }
    report
}
