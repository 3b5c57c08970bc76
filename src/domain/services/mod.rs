//! # Domain Services
//!
//! Pure computations over domain entities.

pub mod reward_estimator;

pub use reward_estimator::{RewardEstimator, MAX_POTENTIAL_POINTS};
