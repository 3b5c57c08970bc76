//! WebSocket Client Transport
//!
//! One spawned task per connection: dial through the selected dialer, run
//! the websocket handshake, then pump inbound frames into the event sink and
//! outbound commands onto the socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::{ConnectRequest, Connector, EventSink, TransportHandle};
use crate::domain::entities::TransportEvent;
use crate::infrastructure::proxy::BoxedStream;
use crate::shared::error::{AgentError, AgentResult};

/// Upper bound on one outbound frame write. A peer that stops reading must
/// not hold up inbound frames or close requests.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

type ClientStream = WebSocketStream<MaybeTlsStream<BoxedStream>>;

enum Command {
    Send(String),
    Close,
}

/// Opens real websocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, request: ConnectRequest, sink: EventSink) -> Box<dyn TransportHandle> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let writable = Arc::new(AtomicBool::new(false));

        tokio::spawn(run_connection(request, sink, cmd_rx, writable.clone()));

        Box::new(WebSocketHandle { cmd_tx, writable })
    }
}

struct WebSocketHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    writable: Arc<AtomicBool>,
}

impl TransportHandle for WebSocketHandle {
    fn send_text(&self, text: String) -> bool {
        self.writable.load(Ordering::Acquire) && self.cmd_tx.send(Command::Send(text)).is_ok()
    }

    fn close(&self) {
        self.writable.store(false, Ordering::Release);
        let _ = self.cmd_tx.send(Command::Close);
    }
}

async fn run_connection(
    request: ConnectRequest,
    sink: EventSink,
    mut commands: mpsc::UnboundedReceiver<Command>,
    writable: Arc<AtomicBool>,
) {
    if let Err(e) = drive(request, &sink, &mut commands, &writable).await {
        sink.emit(TransportEvent::Error(e.to_string()));
    }
    writable.store(false, Ordering::Release);
    sink.emit(TransportEvent::Close);
}

async fn handshake(request: &ConnectRequest) -> AgentResult<ClientStream> {
    let stream = request.dialer.dial(&request.target).await?;
    let (ws, response) =
        client_async_tls_with_config(request.target.as_str(), stream, None, None).await?;
    debug!(status = %response.status(), "WebSocket handshake complete");
    Ok(ws)
}

async fn drive(
    request: ConnectRequest,
    sink: &EventSink,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    writable: &AtomicBool,
) -> AgentResult<()> {
    // A close requested mid-handshake abandons the attempt.
    let ws = tokio::select! {
        result = handshake(&request) => result?,
        _ = commands.recv() => {
            debug!(conn_id = sink.conn_id(), "Close requested during handshake");
            return Ok(());
        }
    };

    let (mut write, mut read) = ws.split();
    writable.store(true, Ordering::Release);
    sink.emit(TransportEvent::Open);

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    sink.emit(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => sink.emit(TransportEvent::Message(text)),
                    Err(_) => debug!(len = bytes.len(), "Ignoring non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    info!(conn_id = sink.conn_id(), frame = ?frame, "Server closed the connection");
                    writable.store(false, Ordering::Release);
                    // Flushes the queued close reply.
                    let _ = write.close().await;
                    return Ok(());
                }
                // Ping/pong is answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },

            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    send_frame(&mut write, Message::Text(text.into())).await?
                }
                Some(Command::Close) | None => {
                    writable.store(false, Ordering::Release);
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            },
        }
    }
}

async fn send_frame<S>(write: &mut S, message: Message) -> AgentResult<()>
where
    S: Sink<Message> + Unpin,
    AgentError: From<S::Error>,
{
    match timeout(SEND_TIMEOUT, write.send(message)).await {
        Ok(result) => result.map_err(AgentError::from),
        Err(_) => Err(AgentError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "websocket write stalled",
        ))),
    }
}
