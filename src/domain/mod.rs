//! # Domain Layer
//!
//! Session state and the time-based reward estimation rules. Nothing here
//! touches the network, the filesystem or the real clock.
//!
//! ## Structure
//!
//! - **entities**: session lifecycle, heartbeat window, points and estimate
//! - **services**: the reward estimator

pub mod entities;
pub mod services;

pub use entities::*;
