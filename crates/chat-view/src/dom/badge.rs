//! Reaction badges and the per-message container that holds them
//!
//! A badge's counter is the length of its contributor list, so the two can
//! never drift apart. An emptied badge is dropped from its container.

use chat_core::{BadgeSnapshot, Jid, MessageId};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::reactions::HeldReaction;

/// One user's contribution to a badge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub user: Jid,
    /// Reaction record that drew this contribution
    pub reaction: MessageId,
}

/// Rendered aggregate for one reaction label under one target message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    label: String,
    contributors: Vec<Contributor>,
}

impl Badge {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            contributors: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Counter value shown next to the label
    #[inline]
    pub fn count(&self) -> usize {
        self.contributors.len()
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn has_user(&self, user: &Jid) -> bool {
        self.contributors.iter().any(|c| &c.user == user)
    }

    pub fn snapshot(&self) -> BadgeSnapshot {
        BadgeSnapshot {
            label: self.label.clone(),
            count: self.count(),
            users: self.contributors.iter().map(|c| c.user.clone()).collect(),
            reaction_ids: self.contributors.iter().map(|c| c.reaction.clone()).collect(),
        }
    }

    /// Badge markup: label, then a counter carrying the contributor list
    pub fn to_html(&self) -> String {
        let reaction_ids = self
            .contributors
            .iter()
            .map(|c| c.reaction.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let users = self
            .contributors
            .iter()
            .map(|c| c.user.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            r#"<div class="react" id="{id}" data-reactionid="{reaction_ids}">{label} +<span data-reactusers="{users}">{count}</span></div>"#,
            id = encode_double_quoted_attribute(&self.label),
            reaction_ids = encode_double_quoted_attribute(&reaction_ids),
            label = encode_text(&self.label),
            users = encode_double_quoted_attribute(&users),
            count = self.count(),
        )
    }
}

/// The `chat-msg__reacts` container under one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionContainer {
    badges: Vec<Badge>,
}

impl ReactionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn badge(&self, label: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Add `user` to the badge for `label`, creating it on first use
    ///
    /// Returns `false` if the user already contributes to that badge.
    pub fn contribute(&mut self, label: &str, user: &Jid, reaction: &MessageId) -> bool {
        let idx = match self.badges.iter().position(|b| b.label == label) {
            Some(idx) => idx,
            None => {
                self.badges.push(Badge::new(label));
                self.badges.len() - 1
            }
        };
        let badge = &mut self.badges[idx];
        if badge.has_user(user) {
            return false;
        }
        badge.contributors.push(Contributor {
            user: user.clone(),
            reaction: reaction.clone(),
        });
        true
    }

    /// Remove `user` from the badge for `label`
    ///
    /// Returns the reaction id that drew the removed contribution. The badge
    /// is destroyed when its last contributor leaves.
    pub fn retract(&mut self, label: &str, user: &Jid) -> Option<MessageId> {
        let idx = self.badges.iter().position(|b| b.label == label)?;
        let badge = &mut self.badges[idx];
        let pos = badge.contributors.iter().position(|c| &c.user == user)?;
        let removed = badge.contributors.remove(pos);
        if badge.contributors.is_empty() {
            self.badges.remove(idx);
        }
        Some(removed.reaction)
    }

    /// Every label `user` currently contributes to
    pub fn held_by(&self, user: &Jid) -> Vec<HeldReaction> {
        self.badges
            .iter()
            .filter_map(|badge| {
                badge
                    .contributors
                    .iter()
                    .find(|c| &c.user == user)
                    .map(|c| HeldReaction {
                        label: badge.label.clone(),
                        reaction: c.reaction.clone(),
                    })
            })
            .collect()
    }

    /// Ids of every reaction drawn into this container
    pub fn reaction_ids(&self) -> impl Iterator<Item = &MessageId> {
        self.badges
            .iter()
            .flat_map(|b| b.contributors.iter().map(|c| &c.reaction))
    }

    pub fn snapshots(&self) -> Vec<BadgeSnapshot> {
        self.badges.iter().map(Badge::snapshot).collect()
    }

    pub fn to_html(&self) -> String {
        let badges: String = self.badges.iter().map(Badge::to_html).collect();
        format!(r#"<div class="chat-msg__reacts">{badges}</div>"#)
    }
}
