//! Data Transfer Objects
//!
//! Wire messages exchanged with the remote service and the status view
//! exposed over HTTP.

pub mod messages;
pub mod status;

pub use messages::{InboundMessage, OutboundMessage};
pub use status::{SharedStatus, StatusSnapshot};
