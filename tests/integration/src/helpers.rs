//! Test helpers for end-to-end view scenarios
//!
//! Wraps a [`ChatView`] with shorthand for feeding events and checking the
//! reaction tally.

use std::collections::HashSet;

use chat_common::{ReactionConfig, ViewConfig};
use chat_core::{BadgeSnapshot, ChangedFields, Jid, Message, MessageId};
use chat_view::{ChatView, ViewResult};

use crate::fixtures::{added, changed, destroyed, reaction};

/// Chat view under test
pub struct TestView {
    pub view: ChatView,
}

impl TestView {
    /// View with default settings and no fade-out animation
    pub fn new() -> Self {
        Self::with_config(test_view_config(), ReactionConfig::default())
    }

    /// View that only resolves deferred reactions on the periodic sweep
    pub fn sweep_only() -> Self {
        Self::with_config(
            test_view_config(),
            ReactionConfig {
                resolve_on_attach: false,
                ..ReactionConfig::default()
            },
        )
    }

    pub fn with_config(view: ViewConfig, reactions: ReactionConfig) -> Self {
        Self {
            view: ChatView::new(view, &reactions),
        }
    }

    /// Add a record, returning its id
    pub async fn add(&mut self, message: Message) -> MessageId {
        let msgid = message.msgid.clone();
        self.view
            .apply(added(message))
            .await
            .expect("Failed to add message");
        msgid
    }

    /// Send a reaction from `from`, returning the reaction's id
    pub async fn react(&mut self, from: &str, label: &str, target: &MessageId) -> MessageId {
        self.add(reaction(from, label, target)).await
    }

    pub async fn change(&mut self, message: Message, fields: ChangedFields) -> ViewResult<()> {
        self.view.apply(changed(message, fields)).await
    }

    pub async fn destroy(&mut self, msgid: &MessageId) -> ViewResult<()> {
        self.view.apply(destroyed(msgid)).await
    }

    pub fn tally(&self, target: &MessageId) -> Vec<BadgeSnapshot> {
        self.view.tally(target)
    }

    /// Badge for `label` under `target`, if drawn
    pub fn badge(&self, target: &MessageId, label: &str) -> Option<BadgeSnapshot> {
        self.tally(target).into_iter().find(|b| b.label == label)
    }

    /// Count shown on the `label` badge, zero when absent
    pub fn count(&self, target: &MessageId, label: &str) -> usize {
        self.badge(target, label).map_or(0, |b| b.count)
    }

    /// Labels `user` contributes to under `target`
    pub fn labels_of(&self, target: &MessageId, user: &str) -> Vec<String> {
        let user = Jid::new(user);
        self.tally(target)
            .into_iter()
            .filter(|b| b.has_user(&user))
            .map(|b| b.label)
            .collect()
    }

    /// Records still waiting for their target
    pub fn pending(&self) -> usize {
        self.view.reactions().pending().count()
    }

    /// Check the structural invariants of every drawn tally
    pub fn assert_consistent(&self) {
        for (target, tally) in self.view.tallies() {
            let mut seen_users = HashSet::new();
            for badge in &tally {
                assert!(badge.count > 0, "empty badge {} on {target}", badge.label);
                assert_eq!(
                    badge.count,
                    badge.users.len(),
                    "count of {} on {target} disagrees with its users",
                    badge.label
                );
                assert_eq!(badge.users.len(), badge.reaction_ids.len());
                for user in &badge.users {
                    assert!(
                        seen_users.insert(user.clone()),
                        "{user} holds more than one label on {target}"
                    );
                }
            }
        }
    }
}

impl Default for TestView {
    fn default() -> Self {
        Self::new()
    }
}

/// View settings without the fade-out delay
pub fn test_view_config() -> ViewConfig {
    ViewConfig {
        animate: false,
        ..ViewConfig::default()
    }
}
