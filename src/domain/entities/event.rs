//! Events consumed by the session loop.

/// What a transport reports about its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    /// Always followed by `Close` once the transport has shut down.
    Error(String),
    /// Emitted exactly once per connection, as its last event.
    Close,
}

/// Everything the session loop reacts to, strictly one at a time.
///
/// Connection-scoped events carry the id of the connection that produced
/// them; events for a connection that is no longer current are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Transport { conn_id: u64, event: TransportEvent },
    PingTick { conn_id: u64 },
    EstimateTick { conn_id: u64 },
    Reconnect,
}

impl SessionEvent {
    pub fn conn_id(&self) -> Option<u64> {
        match self {
            SessionEvent::Transport { conn_id, .. }
            | SessionEvent::PingTick { conn_id }
            | SessionEvent::EstimateTick { conn_id } => Some(*conn_id),
            SessionEvent::Reconnect => None,
        }
    }
}
