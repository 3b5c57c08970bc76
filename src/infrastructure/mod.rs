//! Infrastructure Layer
//!
//! Contains implementations for the session's external collaborators:
//! - WebSocket transport and connection targets
//! - Proxy rotation and proxy-tunnelled dialing
//! - Snapshot persistence (files or memory)
//! - Auth token source and wall clock
//! - Prometheus metrics

pub mod auth;
pub mod clock;
pub mod metrics;
pub mod persistence;
pub mod proxy;
pub mod transport;
