//! Session Timers
//!
//! Timers never run session logic themselves. Each one is a spawned task that
//! posts a [`SessionEvent`] into the session loop; the loop owns the
//! [`TimerHandle`] and cancellation is just dropping it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use crate::domain::entities::SessionEvent;

/// Owned, cancellable timer. Aborted on drop.
#[derive(Debug)]
pub struct TimerHandle(JoinHandle<()>);

impl TimerHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Post `event` every `period`. With `immediate`, the first post happens now.
pub fn spawn_interval(
    period: Duration,
    immediate: bool,
    tx: mpsc::UnboundedSender<SessionEvent>,
    event: SessionEvent,
) -> TimerHandle {
    let start = if immediate {
        Instant::now()
    } else {
        Instant::now() + period
    };

    TimerHandle(tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.send(event.clone()).is_err() {
                break;
            }
        }
    }))
}

/// Post `event` once after `delay`.
pub fn spawn_delay(
    delay: Duration,
    tx: mpsc::UnboundedSender<SessionEvent>,
    event: SessionEvent,
) -> TimerHandle {
    let deadline = Instant::now() + delay;

    TimerHandle(tokio::spawn(async move {
        sleep_until(deadline).await;
        let _ = tx.send(event);
    }))
}
