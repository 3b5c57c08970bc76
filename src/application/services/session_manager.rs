//! Session Manager
//!
//! Owns the single logical connection to the scoring service and drives it
//! through `Idle -> Connecting -> Open -> Idle`, forever.
//!
//! Transport callbacks and timer firings all arrive as [`SessionEvent`]s on
//! one channel and are handled one at a time by [`SessionManager::run`], so
//! none of the session state needs locking. Events tagged with a connection
//! id other than the current one are dropped, which keeps a replaced
//! connection's late callbacks and timer firings from touching the new one.
//!
//! Failure handling:
//! - close: go idle, cancel timers, reconnect after a fixed delay
//! - error: close the transport and let the close path reconnect
//! - missing auth token: stop the loop with a fatal error

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::timers::{spawn_delay, spawn_interval, TimerHandle};
use crate::application::dto::{InboundMessage, OutboundMessage, SharedStatus, StatusSnapshot};
use crate::config::SessionSettings;
use crate::domain::entities::{
    EstimateState, HeartbeatRecord, PointsSnapshot, PointsState, SessionEvent, SessionState,
    SessionStats, TransportEvent,
};
use crate::domain::services::RewardEstimator;
use crate::infrastructure::auth::TokenSource;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::metrics;
use crate::infrastructure::persistence::{get_json, put_json, put_text, SnapshotKey, SnapshotStore};
use crate::infrastructure::proxy::{resolve_dialer, ProxyRotator};
use crate::infrastructure::transport::{
    connection_target, ConnectRequest, Connector, EventSink, TransportHandle,
};
use crate::shared::error::AgentResult;

/// External collaborators of the session.
pub struct SessionDeps<R = StdRng> {
    pub connector: Arc<dyn Connector>,
    pub tokens: Arc<dyn TokenSource>,
    pub store: Arc<dyn SnapshotStore>,
    pub clock: Arc<dyn Clock>,
    pub rotator: ProxyRotator,
    pub estimator: RewardEstimator<R>,
}

/// Session state machine and its owned timers.
pub struct SessionManager<R = StdRng> {
    settings: SessionSettings,
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenSource>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    rotator: ProxyRotator,
    estimator: RewardEstimator<R>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,

    state: SessionState,
    conn_id: u64,
    transport: Option<Box<dyn TransportHandle>>,
    proxy: Option<String>,
    connected_at: Option<DateTime<Utc>>,
    last_ping_at: Option<DateTime<Utc>>,

    ping_timer: Option<TimerHandle>,
    estimate_timer: Option<TimerHandle>,
    reconnect_timer: Option<TimerHandle>,

    heartbeat: Option<HeartbeatRecord>,
    points: Option<PointsState>,
    estimate: EstimateState,
    stats: SessionStats,

    status: SharedStatus,
}

impl<R: Rng> SessionManager<R> {
    pub fn new(settings: SessionSettings, deps: SessionDeps<R>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let status = Arc::new(RwLock::new(StatusSnapshot::new(settings.profile)));

        Self {
            settings,
            connector: deps.connector,
            tokens: deps.tokens,
            store: deps.store,
            clock: deps.clock,
            rotator: deps.rotator,
            estimator: deps.estimator,
            events_tx,
            events_rx,
            state: SessionState::Idle,
            conn_id: 0,
            transport: None,
            proxy: None,
            connected_at: None,
            last_ping_at: None,
            ping_timer: None,
            estimate_timer: None,
            reconnect_timer: None,
            heartbeat: None,
            points: None,
            estimate: EstimateState::unknown(),
            stats: SessionStats::default(),
            status,
        }
    }

    /// Handle to the status snapshot refreshed after every event.
    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn points(&self) -> Option<PointsState> {
        self.points
    }

    pub fn estimate(&self) -> EstimateState {
        self.estimate
    }

    pub fn heartbeat(&self) -> Option<HeartbeatRecord> {
        self.heartbeat
    }

    /// Whether a reconnect is scheduled and has not fired yet.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn tracks_rewards(&self) -> bool {
        self.settings.profile.tracks_rewards()
    }

    /// Seed the points totals from the last persisted snapshot.
    pub async fn restore(&mut self) {
        if !self.tracks_rewards() {
            return;
        }

        match get_json::<PointsSnapshot>(self.store.as_ref(), SnapshotKey::Points).await {
            Ok(Some(snapshot)) => {
                self.points = snapshot.into_state();
                if let Some(points) = &self.points {
                    info!(
                        total = points.total,
                        today = points.today,
                        "Restored last known points"
                    );
                    metrics::set_points(points.total, points.today);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable points snapshot"),
        }
        self.publish();
    }

    /// Start a connection attempt unless one is already in progress or open.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned (missing auth token). Transient failures
    /// schedule a reconnect instead.
    pub async fn connect(&mut self) -> AgentResult<()> {
        if self.state.is_active() {
            debug!(conn_id = self.conn_id, state = %self.state, "Session already active");
            return Ok(());
        }

        // A manual connect supersedes a pending retry.
        self.reconnect_timer = None;

        let result = match self.start_connection().await {
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "Connection attempt failed");
                self.schedule_reconnect();
                Ok(())
            }
            other => other,
        };
        self.publish();
        result
    }

    async fn start_connection(&mut self) -> AgentResult<()> {
        let token = self.tokens.read_token().await?;
        let target = connection_target(&self.settings.endpoint, &token)?;

        let proxy = self.rotator.next();
        let dialer = resolve_dialer(proxy.as_deref());

        self.conn_id += 1;
        self.proxy = dialer.proxy().map(ToString::to_string);
        self.state = SessionState::Connecting;
        self.stats.connection_attempts += 1;
        metrics::record_session_event("attempt");

        match &self.proxy {
            Some(proxy) => info!(
                conn_id = self.conn_id,
                dialer = dialer.kind(),
                proxy = %proxy,
                "Connecting with proxy"
            ),
            None => info!(conn_id = self.conn_id, "Connecting directly"),
        }

        let sink = EventSink::new(self.conn_id, self.events_tx.clone());
        self.transport = Some(self.connector.open(ConnectRequest { target, dialer }, sink));
        Ok(())
    }

    /// Close the session for shutdown. Never schedules a reconnect.
    pub async fn disconnect(&mut self) {
        self.reconnect_timer = None;

        if self.state.is_active() {
            info!(conn_id = self.conn_id, state = %self.state, "Disconnecting");
            if let Some(transport) = self.transport.take() {
                transport.close();
            }
            self.go_idle();
        }
        self.publish();
    }

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns fatal errors from a reconnect attempt.
    pub async fn handle_event(&mut self, event: SessionEvent) -> AgentResult<()> {
        if let Some(conn_id) = event.conn_id() {
            if conn_id != self.conn_id || !self.state.is_active() {
                trace!(conn_id, current = self.conn_id, "Dropping stale event");
                return Ok(());
            }
        }

        match event {
            SessionEvent::Transport { event, .. } => match event {
                TransportEvent::Open => self.on_open().await,
                TransportEvent::Message(text) => self.on_message(&text).await,
                TransportEvent::Error(reason) => self.on_error(&reason),
                TransportEvent::Close => self.on_close(),
            },
            SessionEvent::PingTick { .. } => self.on_ping_tick().await,
            SessionEvent::EstimateTick { .. } => self.on_estimate_tick().await,
            SessionEvent::Reconnect => {
                self.reconnect_timer = None;
                return self.connect().await;
            }
        }

        self.publish();
        Ok(())
    }

    /// Wait for the next queued event without handling it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Handle every event already queued, without waiting for more.
    pub async fn process_pending(&mut self) -> AgentResult<usize> {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Connect and process events until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the loop.
    pub async fn run<F>(mut self, shutdown: F) -> AgentResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.restore().await;
        if let Err(e) = self.connect().await {
            error!(error = %e, "Cannot start session");
            return Err(e);
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down...");
                    self.disconnect().await;
                    return Ok(());
                }
                Some(event) = self.events_rx.recv() => {
                    if let Err(e) = self.handle_event(event).await {
                        error!(error = %e, "Fatal session error");
                        self.disconnect().await;
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn on_open(&mut self) {
        if self.state != SessionState::Connecting {
            debug!(conn_id = self.conn_id, state = %self.state, "Ignoring open outside Connecting");
            return;
        }

        let now = self.clock.now();
        self.state = SessionState::Open;
        self.connected_at = Some(now);
        self.stats.opens += 1;
        metrics::record_session_event("open");
        metrics::set_session_open(true);
        info!(conn_id = self.conn_id, "WebSocket connection established");

        self.ping_timer = Some(spawn_interval(
            self.settings.ping_interval(),
            false,
            self.events_tx.clone(),
            SessionEvent::PingTick {
                conn_id: self.conn_id,
            },
        ));

        if self.tracks_rewards() {
            self.heartbeat = Some(HeartbeatRecord::new(now));
            self.save_text(SnapshotKey::ConnectionOpened, &rfc3339(now))
                .await;

            self.estimate_timer = Some(spawn_interval(
                self.settings.estimate_interval(),
                true,
                self.events_tx.clone(),
                SessionEvent::EstimateTick {
                    conn_id: self.conn_id,
                },
            ));
        }
    }

    async fn on_message(&mut self, text: &str) {
        self.stats.messages_received += 1;
        metrics::record_session_event("message");

        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.stats.malformed_messages += 1;
                metrics::record_session_event("malformed");
                warn!(conn_id = self.conn_id, error = %e, "Ignoring malformed message");
                return;
            }
        };

        if !self.tracks_rewards() {
            info!(conn_id = self.conn_id, message = %text, "Received message");
            return;
        }

        match message {
            InboundMessage::Points(update) => {
                let points = PointsState::from_update(update, self.clock.now());
                self.points = Some(points);
                metrics::set_points(points.total, points.today);
                info!(
                    total = points.total,
                    today = points.today,
                    "Latest points update"
                );
                self.save_json(SnapshotKey::Points, &points.to_snapshot())
                    .await;
            }
            InboundMessage::InvalidPoints(value) => {
                self.stats.malformed_messages += 1;
                metrics::record_session_event("malformed");
                warn!(message = %value, "Ignoring points message with invalid values");
            }
            InboundMessage::Other(value) => {
                debug!(message = %value, "Received message");
            }
        }
    }

    fn on_error(&mut self, reason: &str) {
        self.stats.transport_errors += 1;
        metrics::record_session_event("error");
        warn!(conn_id = self.conn_id, error = %reason, "WebSocket error");

        // Reconnection is left to the close event that follows.
        self.state = SessionState::Closing;
        if let Some(transport) = &self.transport {
            transport.close();
        }
    }

    fn on_close(&mut self) {
        self.stats.closes += 1;
        metrics::record_session_event("close");
        info!(
            conn_id = self.conn_id,
            delay_ms = self.settings.reconnect_delay_ms,
            "WebSocket disconnected, attempting to reconnect"
        );

        self.transport = None;
        self.go_idle();
        self.schedule_reconnect();
    }

    async fn on_ping_tick(&mut self) {
        if self.state != SessionState::Open {
            return;
        }

        let sent = self
            .transport
            .as_ref()
            .is_some_and(|t| t.send_text(OutboundMessage::Ping.to_json()));
        if !sent {
            self.stats.pings_skipped += 1;
            metrics::record_session_event("ping_skipped");
            debug!(conn_id = self.conn_id, "Transport not writable, skipping ping");
            return;
        }

        let now = self.clock.now();
        self.last_ping_at = Some(now);
        self.stats.pings_sent += 1;
        metrics::record_session_event("ping_sent");
        debug!(conn_id = self.conn_id, at = %rfc3339(now), "Ping sent");

        self.save_text(SnapshotKey::LastPing, &rfc3339(now)).await;
    }

    async fn on_estimate_tick(&mut self) {
        if self.state != SessionState::Open || !self.tracks_rewards() {
            return;
        }

        let now = self.clock.now();
        self.estimate = self.estimator.estimate(self.heartbeat.as_ref(), now);
        metrics::set_potential_points(self.estimate.potential_points);
        debug!(
            countdown = %self.estimate.countdown,
            potential_points = self.estimate.potential_points,
            "Estimate updated"
        );

        let estimate = self.estimate;
        self.save_json(SnapshotKey::Estimate, &estimate).await;
    }

    fn go_idle(&mut self) {
        self.state = SessionState::Idle;
        self.ping_timer = None;
        self.estimate_timer = None;
        metrics::set_session_open(false);
    }

    fn schedule_reconnect(&mut self) {
        self.stats.reconnects_scheduled += 1;
        metrics::record_session_event("reconnect_scheduled");
        self.reconnect_timer = Some(spawn_delay(
            self.settings.reconnect_delay(),
            self.events_tx.clone(),
            SessionEvent::Reconnect,
        ));
    }

    async fn save_text(&self, key: SnapshotKey, value: &str) {
        if let Err(e) = put_text(self.store.as_ref(), key, value).await {
            warn!(key = %key, error = %e, "Failed to write snapshot");
        }
    }

    async fn save_json<T: Serialize>(&self, key: SnapshotKey, value: &T) {
        if let Err(e) = put_json(self.store.as_ref(), key, value).await {
            warn!(key = %key, error = %e, "Failed to write snapshot");
        }
    }

    fn publish(&self) {
        let mut status = self.status.write();
        status.state = self.state;
        status.conn_id = self.conn_id;
        status.proxy = self.proxy.clone();
        status.connected_at = self.connected_at;
        status.last_ping_at = self.last_ping_at;
        status.points = self.points.map(|p| p.to_snapshot());
        status.estimate = self.tracks_rewards().then_some(self.estimate);
        status.stats = self.stats;
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
