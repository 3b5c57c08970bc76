//! Snapshot Persistence
//!
//! Write-through key-value blob store for observed session state.
//!
//! This module provides:
//! - A `SnapshotStore` trait with whole-blob `put`/`get` semantics
//! - A `FileSnapshotStore` writing one file per key
//! - A `MemorySnapshotStore` for runs without persistence and for tests
//!
//! Each `put` fully overwrites its key; there is no merging.

mod file_store;
mod memory_store;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::shared::error::AgentResult;

pub use file_store::FileSnapshotStore;
pub use memory_store::MemorySnapshotStore;

/// Keys of the persisted snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    /// RFC 3339 timestamp of the last connection open
    ConnectionOpened,
    /// RFC 3339 timestamp of the last ping sent
    LastPing,
    /// Points totals plus update timestamp
    Points,
    /// Current countdown and potential points
    Estimate,
}

impl SnapshotKey {
    /// File name used by the file-backed store.
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKey::ConnectionOpened => "lastUpdated.txt",
            SnapshotKey::LastPing => "lastPingDate.txt",
            SnapshotKey::Points => "pointsData.json",
            SnapshotKey::Estimate => "pointsStatus.json",
        }
    }
}

impl std::fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// External key-value blob store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replace the blob stored under `key`.
    async fn put(&self, key: SnapshotKey, value: Vec<u8>) -> AgentResult<()>;

    /// Read the blob stored under `key`, if any.
    async fn get(&self, key: SnapshotKey) -> AgentResult<Option<Vec<u8>>>;
}

/// Serialize `value` as JSON and store it under `key`.
pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn SnapshotStore,
    key: SnapshotKey,
    value: &T,
) -> AgentResult<()> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes).await
}

/// Read and deserialize the JSON blob stored under `key`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    key: SnapshotKey,
) -> AgentResult<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Store a plain text value under `key`.
pub async fn put_text(store: &dyn SnapshotStore, key: SnapshotKey, value: &str) -> AgentResult<()> {
    store.put(key, value.as_bytes().to_vec()).await
}
