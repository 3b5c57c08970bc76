//! Rewards profile: heartbeat, estimates, pings, points and snapshots.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::time::Instant;

use scorelink::domain::entities::{Countdown, PointsSnapshot, SessionEvent, SessionState};
use scorelink::infrastructure::persistence::{put_json, MemorySnapshotStore, SnapshotKey};

use crate::common::{epoch, FailingStore, TestSession};

fn is_estimate(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::EstimateTick { .. })
}

fn is_ping(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::PingTick { .. })
}

fn json(t: &TestSession, key: SnapshotKey) -> Value {
    serde_json::from_str(&t.store.text(key).expect("snapshot missing")).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_open_resets_heartbeat_and_records_timestamp() {
    let mut t = TestSession::rewards();
    t.open().await;

    assert_eq!(t.manager.heartbeat().unwrap().last_heartbeat_at, epoch());
    assert_eq!(
        t.store.text(SnapshotKey::ConnectionOpened).as_deref(),
        Some("2024-01-01T12:00:00.000Z")
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_estimate_is_immediate() {
    let mut t = TestSession::rewards();
    t.open().await;

    let opened = Instant::now();
    assert!(is_estimate(&t.step().await));
    assert!(opened.elapsed() < Duration::from_millis(1));

    let estimate = t.manager.estimate();
    assert_eq!(estimate.countdown.to_string(), "15m 0s");
    assert!((0.0..=2.0).contains(&estimate.potential_points));

    let snapshot = json(&t, SnapshotKey::Estimate);
    assert_eq!(snapshot["countdown"], "15m 0s");
    assert!(snapshot["potentialPoints"].is_number());
}

#[tokio::test(start_paused = true)]
async fn test_estimate_accrues_over_window() {
    let mut t = TestSession::rewards();
    t.open().await;

    t.clock.advance(ChronoDuration::seconds(450));
    t.step_until(is_estimate).await;

    let estimate = t.manager.estimate();
    assert_eq!(estimate.countdown.to_string(), "7m 30s");
    assert!(estimate.potential_points >= 12.5);
    assert!(estimate.potential_points <= 14.5);
}

#[tokio::test(start_paused = true)]
async fn test_estimate_caps_after_window() {
    let mut t = TestSession::rewards();
    t.open().await;

    t.clock.advance(ChronoDuration::minutes(16));
    t.step_until(is_estimate).await;

    let estimate = t.manager.estimate();
    assert_eq!(estimate.countdown, Countdown::Calculating);
    assert_eq!(estimate.potential_points, 25.0);
    assert_eq!(json(&t, SnapshotKey::Estimate)["countdown"], "Calculating...");
}

#[tokio::test(start_paused = true)]
async fn test_estimates_tick_every_second() {
    let mut t = TestSession::rewards();
    t.open().await;

    t.step_until(is_estimate).await;
    let first = Instant::now();
    t.step_until(is_estimate).await;
    assert_eq!(first.elapsed(), Duration::from_secs(1));
    assert_eq!(t.store.write_count(SnapshotKey::Estimate), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ping_sent_every_interval() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;

    let opened = Instant::now();
    t.step_until(is_ping).await;
    assert_eq!(opened.elapsed(), Duration::from_secs(10));

    assert_eq!(conn.sent(), vec![r#"{"type":"PING"}"#.to_string()]);
    assert_eq!(t.manager.stats().pings_sent, 1);
    assert_eq!(
        t.store.text(SnapshotKey::LastPing).as_deref(),
        Some("2024-01-01T12:00:00.000Z")
    );

    t.step_until(is_ping).await;
    assert_eq!(opened.elapsed(), Duration::from_secs(20));
    assert_eq!(conn.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ping_skipped_when_not_writable() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;
    conn.set_writable(false);

    t.step_until(is_ping).await;

    assert!(conn.sent().is_empty());
    assert_eq!(t.manager.stats().pings_skipped, 1);
    assert_eq!(t.store.write_count(SnapshotKey::LastPing), 0);
    assert_eq!(t.manager.state(), SessionState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_points_message_updates_and_persists() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;

    conn.deliver(r#"{"pointsTotal":120.5,"pointsToday":7,"message":"ok"}"#);
    t.manager.process_pending().await.unwrap();

    let points = t.manager.points().unwrap();
    assert_eq!(points.total, 120.5);
    assert_eq!(points.today, 7.0);
    assert_eq!(points.last_updated, epoch());

    let snapshot: PointsSnapshot =
        serde_json::from_str(&t.store.text(SnapshotKey::Points).unwrap()).unwrap();
    assert_eq!(snapshot.points_total, 120.5);
    assert_eq!(snapshot.points_today, 7.0);
    assert_eq!(snapshot.last_updated, epoch());

    let raw = json(&t, SnapshotKey::Points);
    assert!(raw.get("pointsTotal").is_some());
    assert!(raw.get("lastUpdated").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_messages_leave_points_alone() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;

    conn.deliver(r#"{"type":"PONG"}"#);
    conn.deliver(r#"{"pointsTotal":10}"#);
    t.manager.process_pending().await.unwrap();

    assert_eq!(t.manager.points(), None);
    assert_eq!(t.manager.stats().messages_received, 2);
    assert_eq!(t.manager.stats().malformed_messages, 0);
    assert_eq!(t.store.write_count(SnapshotKey::Points), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_messages_are_ignored() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;

    conn.deliver("{oops");
    conn.deliver(r#"{"pointsTotal":-5,"pointsToday":1}"#);
    t.manager.process_pending().await.unwrap();

    assert_eq!(t.manager.state(), SessionState::Open);
    assert_eq!(t.manager.points(), None);
    assert_eq!(t.manager.stats().malformed_messages, 2);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_timers_and_keeps_points() {
    let mut t = TestSession::rewards();
    let conn = t.open().await;
    conn.deliver(r#"{"pointsTotal":3,"pointsToday":1}"#);
    t.manager.process_pending().await.unwrap();

    conn.drop_connection();
    t.manager.process_pending().await.unwrap();

    // Only the reconnect can fire now.
    assert_eq!(t.step().await, SessionEvent::Reconnect);
    assert_eq!(t.manager.points().unwrap().total, 3.0);
    assert_eq!(t.store.write_count(SnapshotKey::Estimate), 0);
    assert_eq!(t.manager.stats().pings_sent, 0);
}

#[tokio::test(start_paused = true)]
async fn test_restore_loads_last_points() {
    let memory = Arc::new(MemorySnapshotStore::new());
    let saved = PointsSnapshot {
        points_total: 42.0,
        points_today: 4.5,
        last_updated: epoch(),
    };
    put_json(memory.as_ref(), SnapshotKey::Points, &saved)
        .await
        .unwrap();

    let mut t = TestSession::builder().memory(memory).build();
    t.manager.restore().await;

    let points = t.manager.points().unwrap();
    assert_eq!(points.total, 42.0);
    assert_eq!(points.today, 4.5);
    assert_eq!(
        t.manager.status().read().points.as_ref(),
        Some(&saved)
    );
}

#[tokio::test(start_paused = true)]
async fn test_persistence_failures_do_not_interrupt() {
    let mut t = TestSession::builder().store(Arc::new(FailingStore)).build();
    let conn = t.open().await;
    assert_eq!(t.manager.state(), SessionState::Open);

    conn.deliver(r#"{"pointsTotal":9,"pointsToday":2}"#);
    t.manager.process_pending().await.unwrap();
    assert_eq!(t.manager.points().unwrap().total, 9.0);

    t.step_until(is_ping).await;
    assert_eq!(t.manager.stats().pings_sent, 1);
    assert_eq!(t.manager.state(), SessionState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_status_snapshot_tracks_session() {
    let mut t = TestSession::rewards();
    t.open().await;
    t.step_until(is_estimate).await;

    let status = t.manager.status().read().clone();
    assert_eq!(status.state, SessionState::Open);
    assert_eq!(status.conn_id, 1);
    assert_eq!(status.connected_at, Some(epoch()));
    assert!(status.estimate.is_some());
    assert_eq!(status.stats.opens, 1);
}
