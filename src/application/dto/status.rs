//! Status snapshot published by the session loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::Profile;
use crate::domain::entities::{EstimateState, PointsSnapshot, SessionState, SessionStats};

/// Read-only view of the session for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: SessionState,
    pub profile: Profile,
    pub conn_id: u64,
    /// Proxy of the current connection, password redacted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ping_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<PointsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<EstimateState>,
    pub stats: SessionStats,
}

impl StatusSnapshot {
    pub fn new(profile: Profile) -> Self {
        Self {
            state: SessionState::Idle,
            profile,
            conn_id: 0,
            proxy: None,
            connected_at: None,
            last_ping_at: None,
            points: None,
            estimate: None,
            stats: SessionStats::default(),
        }
    }
}

/// Status shared between the session loop (writer) and HTTP handlers (readers).
pub type SharedStatus = Arc<RwLock<StatusSnapshot>>;
