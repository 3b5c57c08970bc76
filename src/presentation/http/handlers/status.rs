//! Session status endpoint.

use axum::{extract::State, Json};

use crate::application::dto::{SharedStatus, StatusSnapshot};

/// `GET /status` - current session snapshot
pub async fn get_status(State(status): State<SharedStatus>) -> Json<StatusSnapshot> {
    Json(status.read().clone())
}
