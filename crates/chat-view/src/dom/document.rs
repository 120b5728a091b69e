//! Document arena
//!
//! Message nodes keyed by `msgid`, kept in display order. Each chat node owns
//! its reaction container, and a reverse index maps every drawn reaction id to
//! the target it was drawn under, so duplicate checks never walk the tree.

use std::collections::HashMap;

use chat_core::{BadgeSnapshot, Jid, MessageId};
use tokio::time::Instant;

use super::badge::ReactionContainer;
use super::fragment::Fragment;
use crate::reactions::{HeldReaction, ReactionTree};

/// Class added to a node that is being faded out
pub const FADE_OUT_CLASS: &str = "fade-out";

/// One attached message
#[derive(Debug, Clone)]
pub struct MessageNode {
    fragment: Fragment,
    reactions: Option<ReactionContainer>,
    fading_until: Option<Instant>,
}

impl MessageNode {
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn reactions(&self) -> Option<&ReactionContainer> {
        self.reactions.as_ref()
    }

    pub fn is_fading(&self) -> bool {
        self.fading_until.is_some()
    }

    fn to_html(&self) -> String {
        let reactions = self
            .reactions
            .as_ref()
            .map(ReactionContainer::to_html)
            .unwrap_or_default();
        format!(
            "<div {}>{}{}</div>",
            self.fragment.open_tag_attributes(),
            self.fragment.html(),
            reactions
        )
    }
}

/// Result of attaching a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attach {
    /// A new node was appended
    Inserted,
    /// An existing node's fragment was swapped
    ///
    /// `dropped` lists the reactions whose badges were lost because the new
    /// fragment cannot hold a reaction container.
    Replaced { dropped: Vec<MessageId> },
}

/// The rendered message list
#[derive(Debug, Default)]
pub struct Document {
    order: Vec<MessageId>,
    nodes: HashMap<MessageId, MessageNode>,
    /// reaction msgid -> target msgid it is drawn under
    applied: HashMap<MessageId, MessageId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, msgid: &MessageId) -> bool {
        self.nodes.contains_key(msgid)
    }

    /// Attached message ids in display order
    pub fn ids(&self) -> impl Iterator<Item = &MessageId> {
        self.order.iter()
    }

    /// Attach `fragment` under `msgid`, replacing any existing node in place
    ///
    /// A replaced node keeps its badges as long as the new fragment can hold
    /// a reaction container.
    pub fn attach(&mut self, msgid: MessageId, mut fragment: Fragment) -> Attach {
        fragment.set_attribute("data-msgid", msgid.as_str());

        if let Some(node) = self.nodes.get_mut(&msgid) {
            let mut dropped = Vec::new();
            if fragment.accepts_reactions() {
                if node.reactions.is_none() {
                    node.reactions = Some(ReactionContainer::new());
                }
            } else if let Some(container) = node.reactions.take() {
                dropped.extend(container.reaction_ids().cloned());
                for reaction in &dropped {
                    self.applied.remove(reaction);
                }
            }
            node.fragment = fragment;
            node.fading_until = None;
            return Attach::Replaced { dropped };
        }

        let reactions = fragment.accepts_reactions().then(ReactionContainer::new);
        self.order.push(msgid.clone());
        self.nodes.insert(
            msgid,
            MessageNode {
                fragment,
                reactions,
                fading_until: None,
            },
        );
        Attach::Inserted
    }

    /// Remove a node and forget every reaction drawn under it
    pub fn detach(&mut self, msgid: &MessageId) -> Option<MessageNode> {
        let node = self.nodes.remove(msgid)?;
        self.order.retain(|id| id != msgid);
        if let Some(container) = &node.reactions {
            for reaction in container.reaction_ids() {
                self.applied.remove(reaction);
            }
        }
        Some(node)
    }

    pub fn node(&self, msgid: &MessageId) -> Option<&MessageNode> {
        self.nodes.get(msgid)
    }

    pub fn fragment(&self, msgid: &MessageId) -> Option<&Fragment> {
        self.nodes.get(msgid).map(|n| &n.fragment)
    }

    pub fn fragment_mut(&mut self, msgid: &MessageId) -> Option<&mut Fragment> {
        self.nodes.get_mut(msgid).map(|n| &mut n.fragment)
    }

    pub fn container(&self, msgid: &MessageId) -> Option<&ReactionContainer> {
        self.nodes.get(msgid).and_then(|n| n.reactions.as_ref())
    }

    pub(crate) fn container_mut(&mut self, msgid: &MessageId) -> Option<&mut ReactionContainer> {
        self.nodes.get_mut(msgid).and_then(|n| n.reactions.as_mut())
    }

    pub(crate) fn index_reaction(&mut self, reaction: MessageId, target: MessageId) {
        self.applied.insert(reaction, target);
    }

    pub(crate) fn unindex_reaction(&mut self, reaction: &MessageId) {
        self.applied.remove(reaction);
    }

    /// Target under which a reaction is currently drawn
    pub fn applied_target(&self, reaction: &MessageId) -> Option<&MessageId> {
        self.applied.get(reaction)
    }

    /// Current badges under `target`, in creation order
    pub fn tally(&self, target: &MessageId) -> Vec<BadgeSnapshot> {
        self.container(target)
            .map(ReactionContainer::snapshots)
            .unwrap_or_default()
    }

    /// Mark a node for delayed removal
    pub fn fade_out(&mut self, msgid: &MessageId, deadline: Instant) -> bool {
        let Some(node) = self.nodes.get_mut(msgid) else {
            return false;
        };
        node.fragment.add_class(FADE_OUT_CLASS);
        node.fading_until = Some(deadline);
        true
    }

    /// Detach every node whose fade-out deadline has passed
    pub fn reap_faded(&mut self, now: Instant) -> Vec<MessageId> {
        let expired: Vec<MessageId> = self
            .order
            .iter()
            .filter(|id| {
                self.nodes
                    .get(*id)
                    .and_then(|n| n.fading_until)
                    .is_some_and(|deadline| deadline <= now)
            })
            .cloned()
            .collect();
        for msgid in &expired {
            self.detach(msgid);
        }
        expired
    }

    pub fn node_html(&self, msgid: &MessageId) -> Option<String> {
        self.nodes.get(msgid).map(MessageNode::to_html)
    }

    /// Serialize the whole message list
    pub fn to_html(&self) -> String {
        let body: String = self
            .order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(MessageNode::to_html)
            .collect();
        format!(r#"<div class="chat-content">{body}</div>"#)
    }
}

impl ReactionTree for Document {
    fn is_applied(&self, reaction: &MessageId) -> bool {
        self.applied.contains_key(reaction)
    }

    fn has_container(&self, target: &MessageId) -> bool {
        self.container(target).is_some()
    }

    fn contributions(&self, target: &MessageId, user: &Jid) -> Vec<HeldReaction> {
        self.container(target)
            .map(|c| c.held_by(user))
            .unwrap_or_default()
    }
}
