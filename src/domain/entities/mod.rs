//! # Domain Entities
//!
//! State owned by the session engine.
//!
//! - **SessionState / SessionStats**: lifecycle of the single logical session
//! - **HeartbeatRecord**: start of the current 15 minute accrual window
//! - **PointsState**: totals confirmed by the server
//! - **EstimateState**: countdown and potential points, recomputed every tick
//! - **SessionEvent**: tagged transport and timer events

mod estimate;
mod event;
mod heartbeat;
mod points;
mod session;

pub use estimate::{Countdown, EstimateState, CALCULATING};
pub use event::{SessionEvent, TransportEvent};
pub use heartbeat::{HeartbeatRecord, HEARTBEAT_WINDOW_MINUTES};
pub use points::{PointsSnapshot, PointsState, PointsUpdate};
pub use session::{SessionState, SessionStats};
