//! Application Layer
//!
//! The session loop and the data it exchanges with the remote service and
//! the status surface.

pub mod dto;
pub mod services;
