//! Reward Estimator
//!
//! Derives the countdown to the next heartbeat and a potential-points
//! estimate from the start of the current accrual window.
//!
//! Points accrue linearly from 0 to [`MAX_POTENTIAL_POINTS`] over the
//! window. On roughly one tick in ten a small random bonus is added on top;
//! the bonus is not state, so the estimate can visibly fluctuate near the cap.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entities::{Countdown, EstimateState, HeartbeatRecord};

/// Points reachable in one heartbeat window.
pub const MAX_POTENTIAL_POINTS: f64 = 25.0;

/// Chance that a tick receives a bonus.
pub const BONUS_PROBABILITY: f64 = 0.10;

/// Exclusive upper bound of a bonus draw.
pub const MAX_BONUS: f64 = 2.0;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Countdown label for `now`.
pub fn countdown(record: &HeartbeatRecord, now: DateTime<Utc>) -> Countdown {
    let next_due = record.next_due_at();
    if now >= next_due {
        Countdown::Calculating
    } else {
        Countdown::Remaining(next_due - now)
    }
}

/// Linear accrual before any bonus.
pub fn base_points(record: &HeartbeatRecord, now: DateTime<Utc>) -> f64 {
    let elapsed = record.elapsed(now).num_milliseconds() as f64;
    let window = HeartbeatRecord::window().num_milliseconds() as f64;
    let fraction = (elapsed / window).min(1.0);
    round2(fraction * MAX_POTENTIAL_POINTS)
}

/// Add a bonus draw and bring the result back into `[0, MAX_POTENTIAL_POINTS]`.
pub fn apply_bonus(base: f64, bonus: f64) -> f64 {
    round2((base + bonus).clamp(0.0, MAX_POTENTIAL_POINTS))
}

/// Deterministic estimate for a given bonus outcome.
pub fn estimate_with_bonus(
    record: Option<&HeartbeatRecord>,
    now: DateTime<Utc>,
    bonus: Option<f64>,
) -> EstimateState {
    let Some(record) = record else {
        return EstimateState::unknown();
    };

    match countdown(record, now) {
        Countdown::Calculating => EstimateState {
            potential_points: MAX_POTENTIAL_POINTS,
            countdown: Countdown::Calculating,
        },
        remaining => {
            let base = base_points(record, now);
            EstimateState {
                potential_points: bonus.map_or(base, |b| apply_bonus(base, b)),
                countdown: remaining,
            }
        }
    }
}

/// Estimator with an injected random source.
pub struct RewardEstimator<R = StdRng> {
    rng: R,
}

impl RewardEstimator<StdRng> {
    /// Estimator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible estimator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RewardEstimator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Estimate for `now`, drawing a fresh bonus decision.
    pub fn estimate(
        &mut self,
        record: Option<&HeartbeatRecord>,
        now: DateTime<Utc>,
    ) -> EstimateState {
        let bonus = self.roll_bonus();
        estimate_with_bonus(record, now, bonus)
    }

    fn roll_bonus(&mut self) -> Option<f64> {
        if self.rng.random::<f64>() < BONUS_PROBABILITY {
            Some(self.rng.random_range(0.0..MAX_BONUS))
        } else {
            None
        }
    }
}
