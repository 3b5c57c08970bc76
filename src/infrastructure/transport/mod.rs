//! Transport Layer
//!
//! The session loop never touches sockets directly. It asks a [`Connector`]
//! to open a connection and gets back a [`TransportHandle`] for writing and
//! closing; everything the connection reports arrives as tagged
//! [`TransportEvent`]s through an [`EventSink`].
//!
//! Contract every connector honours:
//! - at most one `Open`, then any number of `Message`s
//! - failures are reported as `Error` followed by `Close`
//! - exactly one `Close`, always last, including after a requested close

mod websocket;

use tokio::sync::mpsc;
use url::Url;

use crate::domain::entities::{SessionEvent, TransportEvent};
use crate::infrastructure::proxy::Dialer;
use crate::shared::error::{AgentError, AgentResult};

pub use websocket::WebSocketConnector;

/// Protocol version sent with every connection. Not configurable.
pub const PROTOCOL_VERSION: &str = "v0.2";

/// Delivers events for one connection into the session loop.
#[derive(Debug, Clone)]
pub struct EventSink {
    conn_id: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(conn_id: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { conn_id, tx }
    }

    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    /// Queue an event. Dropped silently once the session loop is gone.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(SessionEvent::Transport {
            conn_id: self.conn_id,
            event,
        });
    }
}

/// Everything needed to open one connection.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub target: Url,
    pub dialer: Dialer,
}

/// Write side and lifecycle control of a live connection.
pub trait TransportHandle: Send {
    /// Queue a text frame. Returns `false` when the transport is not writable.
    fn send_text(&self, text: String) -> bool;

    /// Ask the transport to shut down. It answers with its final `Close` event.
    fn close(&self);
}

/// Opens connections on behalf of the session loop.
pub trait Connector: Send + Sync {
    fn open(&self, request: ConnectRequest, sink: EventSink) -> Box<dyn TransportHandle>;
}

/// Build `<endpoint>/websocket?userId=<token>&version=v0.2`.
pub fn connection_target(endpoint: &str, token: &str) -> AgentResult<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| AgentError::InvalidTarget(format!("{}: {}", endpoint, e)))?;

    let path = format!("{}/websocket", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("userId", token)
        .append_pair("version", PROTOCOL_VERSION);

    Ok(url)
}
