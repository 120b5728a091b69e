//! Chat view - owns the document, the reaction store and one view per message
//!
//! All lifecycle events enter here. Reaction records are routed to the
//! reconciler; everything else is rendered and attached to the document.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use chat_common::{ReactionConfig, ViewConfig};
use chat_core::{
    BadgeSnapshot, BodyHook, ChangedFields, DomainError, Message, MessageEvent, MessageId,
    MessageType, ReactionEvent,
};
use chrono::Duration as ChronoDuration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::message_view::{MessageView, RenderContext, RenderScope, Rendered};
use super::templates::{self, FOLLOWUP_CLASS, HIGHLIGHT_CLASS};
use super::transform::BodyTransformer;
use crate::dom::{Attach, Document, DomReactionRenderer, Fragment};
use crate::error::{ViewError, ViewResult};
use crate::reactions::{self, BadgeOp, ReactionStore, ReconcileOutcome, Sweep, SweepReport};

/// Messages from the same sender within this window are grouped
const FOLLOWUP_WINDOW_MINUTES: i64 = 10;

/// Destroyed ids remembered for dropping late reactions; oldest evicted first
pub const TOMBSTONE_CAPACITY: usize = 1024;

/// Ids of destroyed messages, bounded to the most recent ones
#[derive(Debug, Default)]
struct Tombstones {
    ids: HashSet<MessageId>,
    order: VecDeque<MessageId>,
}

impl Tombstones {
    fn insert(&mut self, msgid: MessageId) {
        if !self.ids.insert(msgid.clone()) {
            return;
        }
        self.order.push_back(msgid);
        while self.order.len() > TOMBSTONE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, msgid: &MessageId) {
        if self.ids.remove(msgid) {
            self.order.retain(|id| id != msgid);
        }
    }

    fn contains(&self, msgid: &MessageId) -> bool {
        self.ids.contains(msgid)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// The message list of one conversation
#[derive(Debug)]
pub struct ChatView {
    config: ViewConfig,
    transformer: BodyTransformer,
    document: Document,
    reactions: ReactionStore,
    views: HashMap<MessageId, MessageView>,
    /// Recently destroyed messages
    destroyed: Tombstones,
    nickname: Option<String>,
    resolve_on_attach: bool,
}

impl ChatView {
    pub fn new(config: ViewConfig, reactions: &ReactionConfig) -> Self {
        let transformer = BodyTransformer::new(&config);
        Self {
            config,
            transformer,
            document: Document::new(),
            reactions: ReactionStore::new(),
            views: HashMap::new(),
            destroyed: Tombstones::default(),
            nickname: None,
            resolve_on_attach: reactions.resolve_on_attach,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn BodyHook>) -> Self {
        self.transformer.add_hook(hook);
        self
    }

    /// Our own nickname, used to highlight groupchat mentions
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn reactions(&self) -> &ReactionStore {
        &self.reactions
    }

    pub fn message(&self, msgid: &MessageId) -> Option<&Message> {
        self.views.get(msgid).map(MessageView::model)
    }

    /// Current badges under a message
    pub fn tally(&self, msgid: &MessageId) -> Vec<BadgeSnapshot> {
        self.document.tally(msgid)
    }

    /// Badges of every attached message that has any, in display order
    pub fn tallies(&self) -> Vec<(MessageId, Vec<BadgeSnapshot>)> {
        self.document
            .ids()
            .map(|id| (id.clone(), self.document.tally(id)))
            .filter(|(_, tally)| !tally.is_empty())
            .collect()
    }

    pub fn to_html(&self) -> String {
        self.document.to_html()
    }

    /// Number of destroyed ids still remembered
    pub fn tombstones(&self) -> usize {
        self.destroyed.len()
    }

    // =========================================================================
    // Lifecycle events
    // =========================================================================

    pub async fn apply(&mut self, event: MessageEvent) -> ViewResult<()> {
        debug!(event = event.event_type(), msgid = %event.msgid(), "Applying message event");
        match event {
            MessageEvent::MessageAdded(e) => self.add_message(e.message).await,
            MessageEvent::MessageChanged(e) => self.change_message(e.message, e.changed).await,
            MessageEvent::MessageDestroyed(e) => self.destroy_message(&e.msgid),
        }
    }

    /// Create a view for a new record and render it
    pub async fn add_message(&mut self, message: Message) -> ViewResult<()> {
        if message.msgid.is_empty() {
            return Err(DomainError::MissingMessageId.into());
        }
        let msgid = message.msgid.clone();
        self.destroyed.remove(&msgid);
        self.views.insert(msgid.clone(), MessageView::new(message));
        self.render_message(&msgid).await
    }

    /// Store the updated record and redraw whatever the change requires
    pub async fn change_message(&mut self, message: Message, changed: ChangedFields) -> ViewResult<()> {
        let msgid = message.msgid.clone();
        let view = self
            .views
            .get_mut(&msgid)
            .ok_or_else(|| ViewError::UnknownMessage(msgid.clone()))?;
        view.set_model(message);
        let action = view.on_changed(changed);
        debug!(msgid = %msgid, changed = %changed, scope = ?action.render, "Message changed");

        match action.render {
            RenderScope::Skip => {}
            RenderScope::Progress => {
                let fragment = view.render_progress()?;
                self.attach(&msgid, fragment);
            }
            RenderScope::Full => self.render_message(&msgid).await?,
        }

        if action.highlight {
            if let Some(fragment) = self.document.fragment_mut(&msgid) {
                fragment.add_class(HIGHLIGHT_CLASS);
            }
        }
        Ok(())
    }

    /// Remove a message, its reaction records and any badge it contributed
    #[instrument(skip(self))]
    pub fn destroy_message(&mut self, msgid: &MessageId) -> ViewResult<()> {
        self.views
            .remove(msgid)
            .ok_or_else(|| ViewError::UnknownMessage(msgid.clone()))?;
        self.destroyed.insert(msgid.clone());

        if let Some(record) = self.reactions.remove(msgid) {
            if let Some(target) = self.document.applied_target(msgid).cloned() {
                let retract = BadgeOp::Retract {
                    target,
                    label: record.event.label,
                    user: record.event.from,
                };
                DomReactionRenderer::apply(&mut self.document, &[retract]);
            }
        }
        let purged = self.reactions.purge_target(msgid);

        if self.config.animate {
            self.document
                .fade_out(msgid, Instant::now() + self.config.fade_out());
        } else {
            self.document.detach(msgid);
        }

        info!(msgid = %msgid, purged_reactions = purged.len(), "Message destroyed");
        Ok(())
    }

    /// Show a spinner, run `action`, then destroy the message on success
    ///
    /// On failure the message is rendered again and the error is returned.
    pub async fn retry<F, E>(&mut self, msgid: &MessageId, action: F) -> ViewResult<()>
    where
        F: Future<Output = Result<(), E>>,
        E: Display,
    {
        if !self.views.contains_key(msgid) {
            return Err(ViewError::UnknownMessage(msgid.clone()));
        }
        self.attach(msgid, templates::spinner());

        match action.await {
            Ok(()) => self.destroy_message(msgid),
            Err(e) => {
                warn!(msgid = %msgid, error = %e, "Retry failed");
                self.render_message(msgid).await?;
                Err(ViewError::Retry {
                    msgid: msgid.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    // =========================================================================
    // Reactions
    // =========================================================================

    /// Reconcile a reaction against the current document
    #[instrument(skip_all, fields(msgid = %event.msgid, reacts_to = %event.reacts_to))]
    pub fn render_reaction(&mut self, event: &ReactionEvent) -> ReconcileOutcome {
        if self.destroyed.contains(&event.reacts_to) {
            debug!("Target was destroyed, dropping reaction");
            self.reactions.remove(&event.msgid);
            return ReconcileOutcome::Orphaned;
        }
        reactions::render_reaction(&mut self.document, &mut self.reactions, event)
    }

    /// Reap faded nodes and retry every pending reaction
    #[instrument(skip(self))]
    pub fn sweep(&mut self) -> SweepReport {
        let reaped = self.document.reap_faded(Instant::now());
        if !reaped.is_empty() {
            debug!(count = reaped.len(), "Removed faded messages");
        }
        reactions::sweep_pending(&mut self.document, &mut self.reactions)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    async fn render_message(&mut self, msgid: &MessageId) -> ViewResult<()> {
        let view = self
            .views
            .get(msgid)
            .ok_or_else(|| ViewError::UnknownMessage(msgid.clone()))?;
        let ctx = RenderContext {
            config: &self.config,
            transformer: &self.transformer,
            nickname: self.nickname.as_deref(),
        };

        let rendered = match view.render(&ctx).await {
            Ok(rendered) => rendered,
            Err(e) if e.is_malformed() => {
                warn!(msgid = %msgid, error = %e, "Skipping unrenderable message");
                Rendered::Nothing
            }
            Err(e) => return Err(e),
        };

        match rendered {
            Rendered::Fragment(mut fragment) => {
                if fragment.accepts_reactions() && self.is_followup(msgid) {
                    fragment.add_class(FOLLOWUP_CLASS);
                }
                self.attach(msgid, fragment);
            }
            Rendered::Reaction(event) => {
                // A record first shown as a message may turn out to be a reaction
                if self.document.detach(msgid).is_some() {
                    debug!(msgid = %msgid, "Detached reaction rendered as a message");
                }
                self.render_reaction(&event);
            }
            Rendered::Nothing => {}
        }
        Ok(())
    }

    /// Attach a fragment, keeping the followup marker and settling reactions
    fn attach(&mut self, msgid: &MessageId, mut fragment: Fragment) {
        if self
            .document
            .fragment(msgid)
            .is_some_and(|f| f.has_class(FOLLOWUP_CLASS))
        {
            fragment.add_class(FOLLOWUP_CLASS);
        }
        let accepts_reactions = fragment.accepts_reactions();

        if let Attach::Replaced { dropped } = self.document.attach(msgid.clone(), fragment) {
            for reaction in &dropped {
                self.reactions.reset_rendered(reaction);
            }
            if !dropped.is_empty() {
                debug!(msgid = %msgid, count = dropped.len(), "Badges lost on re-render");
            }
        }

        if accepts_reactions && self.resolve_on_attach {
            let report = reactions::resolve_pending_for(&mut self.document, &mut self.reactions, msgid);
            if report.attempted > 0 {
                debug!(msgid = %msgid, resolved = report.resolved, "Resolved pending reactions");
            }
        }
    }

    /// Same sender as the chat message displayed just before, within the window
    fn is_followup(&self, msgid: &MessageId) -> bool {
        let Some(current) = self.message(msgid) else {
            return false;
        };
        let previous = self
            .document
            .ids()
            .take_while(|id| *id != msgid)
            .filter(|id| {
                self.document
                    .fragment(id)
                    .is_some_and(Fragment::accepts_reactions)
            })
            .last()
            .and_then(|id| self.message(id));

        previous.is_some_and(|prev| {
            prev.from == current.from
                && prev.sender == current.sender
                && !matches!(prev.msg_type, MessageType::Info | MessageType::Error)
                && (current.time - prev.time).abs() < ChronoDuration::minutes(FOLLOWUP_WINDOW_MINUTES)
        })
    }
}

impl Sweep for ChatView {
    fn sweep(&mut self) -> SweepReport {
        ChatView::sweep(self)
    }
}
