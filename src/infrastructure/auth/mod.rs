//! Auth Token Source
//!
//! The user token lives outside the daemon as a single trimmed line. It is
//! read on every connection attempt so it can be rotated without restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::shared::error::{AgentError, AgentResult};

/// Where the session reads its auth token from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current token.
    ///
    /// # Errors
    ///
    /// `MissingToken` when no token is available. Callers treat this as fatal.
    async fn read_token(&self) -> AgentResult<String>;
}

/// Token stored in a plain text file.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenSource for FileTokenSource {
    async fn read_token(&self) -> AgentResult<String> {
        let display = self.path.display().to_string();
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AgentError::MissingToken(display));
            }
            Err(source) => {
                return Err(AgentError::TokenSource {
                    path: display,
                    source,
                });
            }
        };

        let token = raw.trim();
        if token.is_empty() {
            return Err(AgentError::MissingToken(display));
        }
        Ok(token.to_string())
    }
}
