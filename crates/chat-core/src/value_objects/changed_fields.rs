//! Changed-field flags carried by message change notifications

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Which attributes of a message record were mutated by a change event
    ///
    /// Serialized as a list of lowercase attribute names, e.g. `["message", "edited"]`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangedFields: u32 {
        /// Body text (or reaction label)
        const MESSAGE    = 1 << 0;
        /// Message type (chat, groupchat, error, ...)
        const TYPE       = 1 << 1;
        /// Message is being corrected by its sender
        const CORRECTING = 1 << 2;
        /// Upload state of an attached file
        const UPLOAD     = 1 << 3;
        /// Delivery receipt arrived
        const RECEIVED   = 1 << 4;
        /// File upload progress
        const PROGRESS   = 1 << 5;
        /// Message was edited (a correction was applied)
        const EDITED     = 1 << 6;
        /// Reaction target changed
        const REACTS_TO  = 1 << 7;
        /// Chat state (typing notifications)
        const CHAT_STATE = 1 << 8;
        /// Out-of-band media URL
        const OOB_URL    = 1 << 9;
    }
}

impl ChangedFields {
    /// Attributes whose change requires a full re-render of the entry
    pub const RERENDER: Self = Self::CORRECTING
        .union(Self::MESSAGE)
        .union(Self::TYPE)
        .union(Self::UPLOAD)
        .union(Self::RECEIVED);

    /// Whether a full re-render is needed
    #[inline]
    pub fn needs_render(&self) -> bool {
        self.intersects(Self::RERENDER)
    }

    /// Lowercase names of all set flags
    pub fn names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_lowercase())
            .collect()
    }

    /// Parse a single lowercase attribute name
    pub fn parse_name(name: &str) -> Option<Self> {
        Self::from_name(&name.to_uppercase())
    }
}

impl fmt::Display for ChangedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

impl Serialize for ChangedFields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.names().serialize(serializer)
    }
}

// Unknown attribute names are ignored; the view only reacts to the ones it knows.
impl<'de> Deserialize<'de> for ChangedFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names
            .iter()
            .filter_map(|name| Self::parse_name(name))
            .fold(Self::empty(), |acc, flag| acc | flag))
    }
}
