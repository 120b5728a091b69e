//! Message entity - the mutable record behind one chat entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Jid, MessageId};

/// Prefix that turns a message into a `/me` action
pub const ME_COMMAND: &str = "/me ";

/// Message type as delivered by the messaging layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Chat,
    Groupchat,
    Headline,
    Normal,
    Error,
    Info,
}

/// Who sent the message, relative to the local user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    #[default]
    Them,
}

/// Chat state notification values (typing indicators)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    Active,
    Composing,
    Paused,
    Inactive,
    Gone,
}

/// File data attached to an in-progress upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// Groupchat occupant metadata for the sender
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Occupant {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
}

/// A mention reference into the body text (character offsets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub begin: usize,
    pub end: usize,
    pub uri: String,
}

impl Reference {
    /// The referenced slice of `text`, if the offsets are valid
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.begin >= self.end || self.end > text.chars().count() {
            return None;
        }
        let start = text.char_indices().nth(self.begin).map(|(i, _)| i)?;
        let end = text
            .char_indices()
            .nth(self.end)
            .map_or(text.len(), |(i, _)| i);
        text.get(start..end)
    }
}

/// Message entity
///
/// A record with `reacts_to` set is a reaction; its `message` holds the
/// reaction label instead of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub msgid: MessageId,
    #[serde(default)]
    pub from: Jid,
    #[serde(default)]
    pub jid: Jid,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "reactsTo")]
    pub reacts_to: Option<MessageId>,
    #[serde(default, rename = "type")]
    pub msg_type: MessageType,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub chat_state: Option<ChatState>,
    /// Set when the record announces a file transfer
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub upload: Option<FileUpload>,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub oob_url: Option<String>,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub correcting: bool,
    #[serde(default)]
    pub is_delayed: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub occupant: Option<Occupant>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Message {
    /// Create a plain chat message
    pub fn new(
        msgid: impl Into<MessageId>,
        from: impl Into<Jid>,
        jid: impl Into<Jid>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            msgid: msgid.into(),
            from: from.into(),
            jid: jid.into(),
            message: Some(body.into()),
            reacts_to: None,
            msg_type: MessageType::Chat,
            time: Utc::now(),
            sender: Sender::Them,
            nickname: None,
            chat_state: None,
            file: false,
            upload: None,
            progress: 0.0,
            oob_url: None,
            edited: false,
            correcting: false,
            is_delayed: false,
            is_archived: false,
            occupant: None,
            references: Vec::new(),
        }
    }

    /// Create a reaction record pointing at `reacts_to`
    pub fn new_reaction(
        msgid: impl Into<MessageId>,
        from: impl Into<Jid>,
        jid: impl Into<Jid>,
        label: impl Into<String>,
        reacts_to: impl Into<MessageId>,
    ) -> Self {
        let mut message = Self::new(msgid, from, jid, label);
        message.reacts_to = Some(reacts_to.into());
        message
    }

    /// Check if the record references another message
    #[inline]
    pub fn is_reaction(&self) -> bool {
        self.reacts_to.is_some()
    }

    #[inline]
    pub fn is_groupchat(&self) -> bool {
        self.msg_type == MessageType::Groupchat
    }

    /// Body text, if any
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().filter(|t| !t.is_empty())
    }

    /// Check if the body is a `/me` action
    pub fn is_me_command(&self) -> bool {
        self.text().is_some_and(|t| t.starts_with(ME_COMMAND))
    }

    /// A chat state notification that carries nothing else worth showing
    pub fn is_only_chat_state_notification(&self) -> bool {
        self.chat_state.is_some() && self.oob_url.is_none() && !self.file && self.text().is_none()
    }

    /// Check if the record is an upload still in progress
    pub fn is_file_upload(&self) -> bool {
        self.file && self.oob_url.is_none()
    }

    /// Name shown as the message author
    ///
    /// Prefers the explicit nickname, then the occupant nick of a
    /// groupchat sender, then the sender's bare address.
    pub fn display_name(&self) -> &str {
        if let Some(nick) = self.nickname.as_deref().filter(|n| !n.is_empty()) {
            return nick;
        }
        if self.is_groupchat() {
            if let Some(resource) = self.from.resource() {
                return resource;
            }
        }
        self.from.bare()
    }

    /// Check if any mention reference names `nickname`
    pub fn mentions(&self, nickname: &str) -> bool {
        let Some(text) = self.text() else {
            return false;
        };
        self.references
            .iter()
            .filter_map(|r| r.slice(text))
            .any(|mention| mention.trim_start_matches('@').eq_ignore_ascii_case(nickname))
    }
}
