//! Message and address identifiers
//!
//! Both are opaque strings assigned by the messaging layer. `MessageId` is the
//! stable `msgid` of a record; `Jid` is an XMPP-style address of the form
//! `local@domain/resource`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a message record (`msgid`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new MessageId from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id (used for locally created records)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id means the messaging layer never assigned one
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Address of a user or conversation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jid(String);

impl Jid {
    pub fn new(jid: impl Into<String>) -> Self {
        Self(jid.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The address without its resource part
    pub fn bare(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(bare, _)| bare)
    }

    /// The resource part, which is the occupant nickname in a groupchat
    pub fn resource(&self) -> Option<&str> {
        self.0
            .split_once('/')
            .map(|(_, resource)| resource)
            .filter(|r| !r.is_empty())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Jid {
    fn from(jid: &str) -> Self {
        Self(jid.to_string())
    }
}

impl From<String> for Jid {
    fn from(jid: String) -> Self {
        Self(jid)
    }
}
