// crates/api/src/history.rs

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use retort_core::ReplySet;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: uuid::Uuid,
    pub responses: ReplySet,
    pub timestamp: DateTime<Utc>,
}

/// Most recent reply sets, newest first, bounded by `capacity`.
pub struct HistoryStore {
    capacity: usize,
    entries: RwLock<VecDeque<HistoryEntry>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, responses: ReplySet) -> HistoryEntry {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4(),
            responses,
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.write();
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);

        entry
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
