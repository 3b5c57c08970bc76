//! File-backed snapshot store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{SnapshotKey, SnapshotStore};
use crate::shared::error::{AgentError, AgentResult};

/// Writes each snapshot key to its own file under a data directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the data directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> AgentResult<Self> {
        let store = Self::new(dir);
        tokio::fs::create_dir_all(&store.dir).await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: SnapshotKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn put(&self, key: SnapshotKey, value: Vec<u8>) -> AgentResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");

        tokio::fs::write(&tmp, &value)
            .await
            .map_err(|e| AgentError::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AgentError::Persistence(format!("rename {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }

    async fn get(&self, key: SnapshotKey) -> AgentResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AgentError::Persistence(format!("read {}: {}", path.display(), e))),
        }
    }
}
