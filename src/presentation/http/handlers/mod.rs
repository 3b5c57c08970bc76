//! HTTP Handlers
//!
//! Request handlers for the status surface.

pub mod health;
pub mod status;
