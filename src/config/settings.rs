//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration structure containing all daemon settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Remote session configuration (endpoint, timers, profile)
    pub session: SessionSettings,

    /// Auth token source
    pub auth: AuthSettings,

    /// Proxy list source
    pub proxy: ProxySettings,

    /// Snapshot persistence
    pub persistence: PersistenceSettings,

    /// Optional HTTP status surface
    pub status: StatusSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Which parts of the session engine are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Heartbeat tracking, reward estimation and points snapshots.
    Rewards,
    /// Keep the connection alive and log inbound traffic only.
    Relay,
}

impl Profile {
    pub fn tracks_rewards(&self) -> bool {
        matches!(self, Profile::Rewards)
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Rewards => write!(f, "rewards"),
            Profile::Relay => write!(f, "relay"),
        }
    }
}

/// Remote session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Base websocket URL of the scoring service (e.g., "wss://secure.ws.teneo.pro")
    pub endpoint: String,

    /// Fixed delay before reconnecting after a close, in milliseconds
    pub reconnect_delay_ms: u64,

    /// Liveness ping interval in milliseconds
    pub ping_interval_ms: u64,

    /// Reward estimator tick interval in milliseconds
    pub estimate_interval_ms: u64,

    /// Deployment profile
    pub profile: Profile,
}

/// Auth token source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// File holding the user token as a single line
    pub token_file: String,
}

/// Proxy list configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    /// Newline-delimited proxy URL list; a missing file means no proxy
    pub list_file: String,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceSettings {
    /// Write snapshots to disk. When false they are kept in memory only.
    pub enabled: bool,

    /// Directory receiving the snapshot files
    pub data_dir: String,
}

/// HTTP status surface configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a timer interval or the endpoint is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("session.endpoint", "wss://secure.ws.teneo.pro")?
            .set_default("session.reconnect_delay_ms", 5000_i64)?
            .set_default("session.ping_interval_ms", 10000_i64)?
            .set_default("session.estimate_interval_ms", 1000_i64)?
            .set_default("session.profile", "rewards")?
            .set_default("auth.token_file", "userId.txt")?
            .set_default("proxy.list_file", "proxies.txt")?
            .set_default("persistence.enabled", true)?
            .set_default("persistence.data_dir", ".")?
            .set_default("status.enabled", false)?
            .set_default("status.host", "127.0.0.1")?
            .set_default("status.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SESSION__PROFILE=relay -> session.profile = relay
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.token_file", std::env::var("TOKEN_FILE").ok())?
            .set_override_option("proxy.list_file", std::env::var("PROXY_FILE").ok())?
            .set_override_option("persistence.data_dir", std::env::var("DATA_DIR").ok())?
            .set_override_option("status.port", std::env::var("STATUS_PORT").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Reject settings the session engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;
        for (name, value) in [
            ("session.reconnect_delay_ms", session.reconnect_delay_ms),
            ("session.ping_interval_ms", session.ping_interval_ms),
            ("session.estimate_interval_ms", session.estimate_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Message(format!("{} must be greater than 0", name)));
            }
        }

        if !(session.endpoint.starts_with("ws://") || session.endpoint.starts_with("wss://")) {
            return Err(ConfigError::Message(format!(
                "session.endpoint must be a ws:// or wss:// URL, got {}",
                session.endpoint
            )));
        }

        Ok(())
    }

    /// Get the status server address as a string.
    pub fn status_addr(&self) -> String {
        format!("{}:{}", self.status.host, self.status.port)
    }
}

impl SessionSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn estimate_interval(&self) -> Duration {
        Duration::from_millis(self.estimate_interval_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            endpoint: "wss://secure.ws.teneo.pro".to_string(),
            reconnect_delay_ms: 5000,
            ping_interval_ms: 10000,
            estimate_interval_ms: 1000,
            profile: Profile::Rewards,
        }
    }
}
