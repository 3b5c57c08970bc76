//! # Scorelink Library
//!
//! An auto-reconnecting websocket session daemon:
//! - one logical session, reconnected after every close
//! - liveness pings while the session is open
//! - client-side reward estimation over a 15 minute heartbeat window
//! - per-attempt proxy rotation (HTTP, HTTPS, SOCKS4/5)
//! - write-through snapshots of observed state
//!
//! ## Module Structure
//!
//! ```text
//! scorelink/
//! +-- config/         Configuration management
//! +-- domain/         Session entities and the reward estimator
//! +-- application/    Session manager, timers and DTOs
//! +-- infrastructure/ Transport, proxies, persistence, metrics
//! +-- presentation/   HTTP status surface
//! +-- shared/         Common error type
//! ```

// Configuration module
pub mod config;

// Domain layer - session entities and estimation
pub mod domain;

// Application layer - session loop
pub mod application;

// Infrastructure layer - external implementations
pub mod infrastructure;

// Presentation layer - status HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup
pub mod startup;

// Telemetry and observability
pub mod telemetry;
