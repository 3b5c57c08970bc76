//! Presentation Layer
//!
//! Read-only HTTP status surface over the running session.

pub mod http;
