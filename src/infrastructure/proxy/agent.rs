//! Connection Agent
//!
//! Turns a proxy URL (or its absence) into a [`Dialer`]: the strategy used
//! to open the byte stream the websocket handshake runs over.

use std::fmt;

use percent_encoding::percent_decode_str;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_socks::tcp::{Socks4Stream, Socks5Stream};
use tracing::{debug, warn};
use url::{Host, Url};

use super::tunnel::{self, Credentials};
use crate::shared::error::{AgentError, AgentResult};

/// Any stream the websocket handshake can run over.
pub trait ProxyStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ProxyStream for T {}

pub type BoxedStream = Box<dyn ProxyStream>;

/// A parsed proxy server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

impl ProxyEndpoint {
    pub fn authority(&self) -> String {
        tunnel::authority(&self.host, self.port)
    }
}

/// Displays the endpoint with the password redacted.
impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(credentials) = &self.credentials {
            write!(f, "{}:***@", credentials.username)?;
        }
        f.write_str(&self.authority())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksVersion {
    V4,
    V5,
}

/// Transport-establishment strategy for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialer {
    Direct,
    HttpTunnel(ProxyEndpoint),
    HttpsTunnel(ProxyEndpoint),
    Socks(SocksVersion, ProxyEndpoint),
}

impl Dialer {
    /// Build a dialer from a proxy URL.
    ///
    /// # Errors
    ///
    /// `InvalidProxyUrl` when the URL does not parse or has no host,
    /// `UnsupportedProxyScheme` for anything but http, https and socks*.
    pub fn from_proxy_url(raw: &str) -> AgentResult<Self> {
        let invalid = |reason: String| AgentError::InvalidProxyUrl {
            url: redact(raw),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        let scheme = url.scheme().to_ascii_lowercase();

        let default_port = match scheme.as_str() {
            "http" => 80,
            "https" => 443,
            s if s.starts_with("socks") => 1080,
            _ => return Err(AgentError::UnsupportedProxyScheme(scheme)),
        };

        let host = host_of(&url).ok_or_else(|| invalid("missing host".into()))?;
        let credentials = if url.username().is_empty() {
            None
        } else {
            Some(Credentials {
                username: decode_userinfo(url.username()).map_err(&invalid)?,
                password: decode_userinfo(url.password().unwrap_or_default())
                    .map_err(&invalid)?,
            })
        };
        let endpoint = ProxyEndpoint {
            host,
            port: url.port().unwrap_or(default_port),
            credentials,
        };

        Ok(match scheme.as_str() {
            "http" => Dialer::HttpTunnel(endpoint),
            "https" => Dialer::HttpsTunnel(endpoint),
            s if s.starts_with("socks4") => Dialer::Socks(SocksVersion::V4, endpoint),
            _ => Dialer::Socks(SocksVersion::V5, endpoint),
        })
    }

    /// Short name of the strategy, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Dialer::Direct => "direct",
            Dialer::HttpTunnel(_) => "http",
            Dialer::HttpsTunnel(_) => "https",
            Dialer::Socks(SocksVersion::V4, _) => "socks4",
            Dialer::Socks(SocksVersion::V5, _) => "socks5",
        }
    }

    pub fn proxy(&self) -> Option<&ProxyEndpoint> {
        match self {
            Dialer::Direct => None,
            Dialer::HttpTunnel(p) | Dialer::HttpsTunnel(p) | Dialer::Socks(_, p) => Some(p),
        }
    }

    /// Open a byte stream to the host of `target`.
    pub async fn dial(&self, target: &Url) -> AgentResult<BoxedStream> {
        let host = host_of(target)
            .ok_or_else(|| AgentError::InvalidTarget(format!("{} has no host", target)))?;
        let port = target
            .port_or_known_default()
            .ok_or_else(|| AgentError::InvalidTarget(format!("{} has no port", target)))?;

        debug!(dialer = self.kind(), host = %host, port, "Dialing");

        match self {
            Dialer::Direct => {
                let tcp = TcpStream::connect((host.as_str(), port)).await?;
                Ok(Box::new(tcp))
            }
            Dialer::HttpTunnel(proxy) => {
                let tcp = TcpStream::connect(proxy.authority()).await?;
                let stream =
                    tunnel::http_connect(tcp, &host, port, proxy.credentials.as_ref()).await?;
                Ok(Box::new(stream))
            }
            Dialer::HttpsTunnel(proxy) => {
                let tcp = TcpStream::connect(proxy.authority()).await?;
                let tls = tunnel::tls_to_proxy(tcp, &proxy.host).await?;
                let stream =
                    tunnel::http_connect(tls, &host, port, proxy.credentials.as_ref()).await?;
                Ok(Box::new(stream))
            }
            Dialer::Socks(SocksVersion::V5, proxy) => {
                let proxy_addr = proxy.authority();
                let target = (host.as_str(), port);
                let stream = match &proxy.credentials {
                    Some(c) => {
                        Socks5Stream::connect_with_password(
                            proxy_addr.as_str(),
                            target,
                            &c.username,
                            &c.password,
                        )
                        .await?
                    }
                    None => Socks5Stream::connect(proxy_addr.as_str(), target).await?,
                };
                Ok(Box::new(stream))
            }
            Dialer::Socks(SocksVersion::V4, proxy) => {
                let proxy_addr = proxy.authority();
                let target = (host.as_str(), port);
                let stream = match &proxy.credentials {
                    Some(c) => {
                        Socks4Stream::connect_with_userid(proxy_addr.as_str(), target, &c.username)
                            .await?
                    }
                    None => Socks4Stream::connect(proxy_addr.as_str(), target).await?,
                };
                Ok(Box::new(stream))
            }
        }
    }
}

/// Resolve the dialer for one connection attempt.
///
/// An unusable proxy URL is logged and the attempt falls back to a direct
/// connection.
pub fn resolve_dialer(proxy: Option<&str>) -> Dialer {
    let Some(raw) = proxy else {
        return Dialer::Direct;
    };

    match Dialer::from_proxy_url(raw) {
        Ok(dialer) => dialer,
        Err(e) => {
            warn!(error = %e, "Unusable proxy, connecting directly for this attempt");
            Dialer::Direct
        }
    }
}

fn host_of(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) if !domain.is_empty() => Some(domain.to_string()),
        Host::Domain(_) => None,
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

/// Percent-decode one userinfo component of a proxy URL.
fn decode_userinfo(raw: &str) -> Result<String, String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| "credentials are not valid UTF-8 once decoded".to_string())
}

/// Strip the password from a raw proxy URL before it reaches a log line.
fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => match raw.rsplit_once('@') {
            Some((_, rest)) => format!("***@{}", rest),
            None => raw.to_string(),
        },
    }
}
