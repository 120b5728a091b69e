//! Reaction store
//!
//! Remembers every reaction seen by the view, with its `rendered` / `removed`
//! flags. Records are kept in arrival order and indexed by `msgid`; at most
//! one record exists per `msgid`.

use std::collections::HashMap;

use chat_core::{MessageId, ReactionEvent, ReactionRecord};

/// In-memory index of reaction records
#[derive(Debug, Default)]
pub struct ReactionStore {
    records: Vec<ReactionRecord>,
    index: HashMap<MessageId, usize>,
}

impl ReactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &ReactionRecord> {
        self.records.iter()
    }

    pub fn find(&self, msgid: &MessageId) -> Option<&ReactionRecord> {
        self.index.get(msgid).map(|&i| &self.records[i])
    }

    fn find_mut(&mut self, msgid: &MessageId) -> Option<&mut ReactionRecord> {
        let i = *self.index.get(msgid)?;
        self.records.get_mut(i)
    }

    /// Insert an unresolved record, or return the existing one for this `msgid`
    pub fn upsert(&mut self, event: ReactionEvent) -> &ReactionRecord {
        let i = match self.index.get(&event.msgid) {
            Some(&i) => i,
            None => {
                let i = self.records.len();
                self.index.insert(event.msgid.clone(), i);
                self.records.push(ReactionRecord::new(event));
                i
            }
        };
        &self.records[i]
    }

    /// Flag a record as drawn
    ///
    /// Removed records stay removed. Returns `true` if the flag changed.
    pub fn mark_rendered(&mut self, msgid: &MessageId) -> bool {
        match self.find_mut(msgid) {
            Some(record) if !record.removed && !record.rendered => {
                record.rendered = true;
                true
            }
            _ => false,
        }
    }

    /// Flag a record as retracted; clears `rendered`
    pub fn mark_removed(&mut self, msgid: &MessageId) -> bool {
        match self.find_mut(msgid) {
            Some(record) if !record.removed => {
                record.removed = true;
                record.rendered = false;
                true
            }
            _ => false,
        }
    }

    /// Send a drawn record back to pending after its badge was lost
    pub fn reset_rendered(&mut self, msgid: &MessageId) -> bool {
        match self.find_mut(msgid) {
            Some(record) if record.rendered => {
                record.rendered = false;
                true
            }
            _ => false,
        }
    }

    /// Records neither drawn nor retracted, in arrival order
    pub fn pending(&self) -> impl Iterator<Item = &ReactionRecord> {
        self.records.iter().filter(|r| r.is_pending())
    }

    /// Pending records that react to `target`
    pub fn pending_for<'a>(
        &'a self,
        target: &'a MessageId,
    ) -> impl Iterator<Item = &'a ReactionRecord> + 'a {
        self.pending().filter(move |r| r.reacts_to() == target)
    }

    /// Drop a single record
    pub fn remove(&mut self, msgid: &MessageId) -> Option<ReactionRecord> {
        let i = self.index.remove(msgid)?;
        let record = self.records.remove(i);
        self.reindex();
        Some(record)
    }

    /// Drop every record that reacts to `target`
    pub fn purge_target(&mut self, target: &MessageId) -> Vec<ReactionRecord> {
        let (purged, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| r.reacts_to() == target);
        self.records = kept;
        self.reindex();
        purged
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.msgid().clone(), i))
            .collect();
    }
}
