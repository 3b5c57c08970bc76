//! Application Services
//!
//! - **SessionManager**: connection lifecycle, pings, estimates, reconnects
//! - **timers**: owned periodic and one-shot timers feeding the session loop

pub mod session_manager;
pub mod timers;

pub use session_manager::{SessionDeps, SessionManager};
pub use timers::TimerHandle;
