//! Session lifecycle state and per-session counters.

use serde::Serialize;

/// Lifecycle state of the single logical session.
///
/// Only `Idle -> Connecting` is externally triggerable; every other
/// transition is driven by transport events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
}

impl SessionState {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }

    /// A session that is not idle owns a live transport.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters accumulated over the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub connection_attempts: u64,
    pub opens: u64,
    pub closes: u64,
    pub transport_errors: u64,
    pub reconnects_scheduled: u64,
    pub pings_sent: u64,
    pub pings_skipped: u64,
    pub messages_received: u64,
    pub malformed_messages: u64,
}
