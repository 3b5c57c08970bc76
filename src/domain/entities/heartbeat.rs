//! Heartbeat window tracking.

use chrono::{DateTime, Duration, Utc};

/// Length of one reward accrual window.
pub const HEARTBEAT_WINDOW_MINUTES: i64 = 15;

/// Start of the current accrual window.
///
/// The server heartbeat is approximated by the connection-open time, so the
/// record is reset on every open event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatRecord {
    pub last_heartbeat_at: DateTime<Utc>,
}

impl HeartbeatRecord {
    pub fn new(last_heartbeat_at: DateTime<Utc>) -> Self {
        Self { last_heartbeat_at }
    }

    pub fn window() -> Duration {
        Duration::minutes(HEARTBEAT_WINDOW_MINUTES)
    }

    /// When the next heartbeat is expected.
    pub fn next_due_at(&self) -> DateTime<Utc> {
        self.last_heartbeat_at + Self::window()
    }

    /// Time spent in the current window, never negative.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_heartbeat_at).max(Duration::zero())
    }
}
