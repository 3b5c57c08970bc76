//! Server-confirmed points totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated points pair carried by an inbound message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsUpdate {
    pub total: f64,
    pub today: f64,
}

impl PointsUpdate {
    /// Build an update, rejecting negative or non-finite values.
    pub fn new(total: f64, today: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        (valid(total) && valid(today)).then_some(Self { total, today })
    }
}

/// Last points totals reported by the server.
///
/// The server is authoritative: an update replaces both fields at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsState {
    pub total: f64,
    pub today: f64,
    pub last_updated: DateTime<Utc>,
}

impl PointsState {
    pub fn from_update(update: PointsUpdate, at: DateTime<Utc>) -> Self {
        Self {
            total: update.total,
            today: update.today,
            last_updated: at,
        }
    }

    pub fn to_snapshot(&self) -> PointsSnapshot {
        PointsSnapshot {
            points_total: self.total,
            points_today: self.today,
            last_updated: self.last_updated,
        }
    }
}

/// Persisted form of [`PointsState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSnapshot {
    pub points_total: f64,
    pub points_today: f64,
    pub last_updated: DateTime<Utc>,
}

impl PointsSnapshot {
    /// Restore state from a snapshot, dropping snapshots with invalid totals.
    pub fn into_state(self) -> Option<PointsState> {
        PointsUpdate::new(self.points_total, self.points_today)
            .map(|update| PointsState::from_update(update, self.last_updated))
    }
}
