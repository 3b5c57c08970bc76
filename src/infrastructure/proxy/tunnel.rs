//! Proxy tunnel handshakes.
//!
//! HTTP(S) proxies are asked to open a raw tunnel with `CONNECT`; the
//! websocket handshake (including the TLS layer of `wss://`) then runs
//! through that tunnel unchanged.

use std::sync::Arc;

use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::shared::error::{AgentError, AgentResult};

/// Upper bound on a proxy's CONNECT response head.
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// Username and password taken from a proxy URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Value of a `Proxy-Authorization: Basic` header.
    pub fn basic_token(&self) -> String {
        base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `host:port`, bracketing IPv6 literals.
pub fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Ask an HTTP proxy to open a tunnel to `host:port`.
pub async fn http_connect<S>(
    mut stream: S,
    host: &str,
    port: u16,
    credentials: Option<&Credentials>,
) -> AgentResult<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target = authority(host, port);
    let mut request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
    if let Some(credentials) = credentials {
        request.push_str(&format!(
            "Proxy-Authorization: Basic {}\r\n",
            credentials.basic_token()
        ));
    }
    request.push_str("\r\n");

    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let head = read_response_head(&mut stream).await?;
    let status = parse_status(&head)?;
    if !(200..300).contains(&status) {
        return Err(AgentError::ProxyHandshake(format!(
            "proxy answered CONNECT {} with status {}",
            target, status
        )));
    }

    debug!(target = %target, status, "Proxy tunnel established");
    Ok(stream)
}

/// Read up to and including the blank line ending the response head.
///
/// Reads byte by byte so no tunnelled bytes are consumed.
async fn read_response_head<S>(stream: &mut S) -> AgentResult<String>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(256);
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_RESPONSE_HEAD {
            return Err(AgentError::ProxyHandshake(
                "proxy response head too large".into(),
            ));
        }
        match stream.read_u8().await {
            Ok(byte) => head.push(byte),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(AgentError::ProxyHandshake(
                    "proxy closed the connection during CONNECT".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

fn parse_status(head: &str) -> AgentResult<u16> {
    let status_line = head.lines().next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();
    match (parts.next(), parts.next().and_then(|s| s.parse::<u16>().ok())) {
        (Some(version), Some(status)) if version.starts_with("HTTP/") => Ok(status),
        _ => Err(AgentError::ProxyHandshake(format!(
            "malformed proxy status line: {:?}",
            status_line
        ))),
    }
}

/// Install the process-wide rustls crypto provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

fn tls_client_config() -> rustls::ClientConfig {
    install_crypto_provider();

    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// TLS handshake with an HTTPS proxy.
pub async fn tls_to_proxy(tcp: TcpStream, proxy_host: &str) -> AgentResult<TlsStream<TcpStream>> {
    let connector = TlsConnector::from(Arc::new(tls_client_config()));
    let server_name = rustls::pki_types::ServerName::try_from(proxy_host.to_string())
        .map_err(|e| AgentError::ProxyHandshake(format!("invalid TLS name {}: {}", proxy_host, e)))?;

    let tls = connector.connect(server_name, tcp).await?;
    debug!(proxy = %proxy_host, "TLS handshake with proxy complete");
    Ok(tls)
}
