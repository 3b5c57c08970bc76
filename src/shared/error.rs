//! Agent Error Types
//!
//! Centralized error handling for the session daemon.
//!
//! Errors fall into four classes:
//! - **Fatal startup**: missing auth token or broken configuration. The
//!   process stops.
//! - **Transient connection**: anything the transport or a proxy reports.
//!   Always recovered by the reconnect loop.
//! - **Malformed input**: bad inbound frames or proxy URLs. Logged and
//!   ignored.
//! - **Persistence**: snapshot writes. Logged, never interrupts the session.

/// Agent error type
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Auth token missing or empty at {0}")]
    MissingToken(String),

    #[error("Failed to read auth token from {path}: {source}")]
    TokenSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid proxy URL {url}: {reason}")]
    InvalidProxyUrl { url: String, reason: String },

    #[error("Unsupported proxy scheme: {0}")]
    UnsupportedProxyScheme(String),

    #[error("Proxy handshake failed: {0}")]
    ProxyHandshake(String),

    #[error("SOCKS error: {0}")]
    Socks(#[from] tokio_socks::Error),

    #[error("Invalid connection target: {0}")]
    InvalidTarget(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AgentError {
    /// Whether the error must stop the process instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::MissingToken(_) | AgentError::TokenSource { .. } | AgentError::Config(_)
        )
    }
}

/// Result alias used across the crate
pub type AgentResult<T> = Result<T, AgentError>;
