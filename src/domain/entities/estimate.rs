//! Countdown and potential-points estimate.

use std::fmt;

use chrono::Duration;
use serde::{Serialize, Serializer};

/// Label shown while no countdown can be computed.
pub const CALCULATING: &str = "Calculating...";

/// Time left until the next expected heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No heartbeat yet, or the window has fully elapsed.
    Calculating,
    Remaining(Duration),
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Calculating => f.write_str(CALCULATING),
            Countdown::Remaining(diff) => {
                let ms = diff.num_milliseconds();
                write!(f, "{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
            }
        }
    }
}

impl Serialize for Countdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of one estimator tick. Never carried across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateState {
    pub potential_points: f64,
    pub countdown: Countdown,
}

impl EstimateState {
    /// Estimate before any heartbeat has been observed.
    pub fn unknown() -> Self {
        Self {
            potential_points: 0.0,
            countdown: Countdown::Calculating,
        }
    }
}

impl Default for EstimateState {
    fn default() -> Self {
        Self::unknown()
    }
}
