//! Proxy Support
//!
//! - `rotator`: cycles the configured proxy list per connection attempt
//! - `agent`: maps a proxy URL to a dialer (direct, HTTP/HTTPS tunnel, SOCKS)
//! - `tunnel`: CONNECT and TLS handshakes for HTTP(S) proxies

pub mod agent;
pub mod rotator;
pub mod tunnel;

pub use agent::{resolve_dialer, BoxedStream, Dialer, ProxyEndpoint, SocksVersion};
pub use rotator::ProxyRotator;
pub use tunnel::Credentials;
