//! In-memory snapshot store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{SnapshotKey, SnapshotStore};
use crate::shared::error::AgentResult;

/// Keeps snapshots in process memory, counting writes per key.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: RwLock<HashMap<SnapshotKey, Vec<u8>>>,
    writes: RwLock<HashMap<SnapshotKey, usize>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls seen for `key`.
    pub fn write_count(&self, key: SnapshotKey) -> usize {
        self.writes.read().get(&key).copied().unwrap_or(0)
    }

    /// Current value of `key` as UTF-8 text.
    pub fn text(&self, key: SnapshotKey) -> Option<String> {
        self.entries
            .read()
            .get(&key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, key: SnapshotKey, value: Vec<u8>) -> AgentResult<()> {
        self.entries.write().insert(key, value);
        *self.writes.write().entry(key).or_insert(0) += 1;
        Ok(())
    }

    async fn get(&self, key: SnapshotKey) -> AgentResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(&key).cloned())
    }
}
