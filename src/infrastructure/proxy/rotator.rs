//! Proxy Rotation
//!
//! Cycles through the configured proxy list, one entry per connection
//! attempt, regardless of whether the previous attempt succeeded.

use std::path::Path;

use tracing::info;

/// Ordered proxy list plus a cursor into it.
#[derive(Debug, Clone, Default)]
pub struct ProxyRotator {
    proxies: Vec<String>,
    cursor: usize,
}

impl ProxyRotator {
    pub fn new(proxies: Vec<String>) -> Self {
        Self { proxies, cursor: 0 }
    }

    /// Parse a newline-delimited list. Blank lines and `#` comments are dropped.
    pub fn parse(contents: &str) -> Self {
        let proxies = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self::new(proxies)
    }

    /// Load the list from `path`. A missing file means "no proxy".
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let rotator = Self::parse(&contents);
                info!(count = rotator.len(), path = %path.display(), "Loaded proxies");
                Ok(rotator)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No proxy list found, connecting without proxy");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Proxy for the next connection attempt, or `None` when the list is empty.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let proxy = self.proxies[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.proxies.len();
        Some(proxy)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
