//! TCP transport and target resolution.
//!
//! IP-literal hostnames are resolved to socket addresses directly so no
//! DNS lookup is ever issued for them; everything else goes through the
//! OS resolver. The dialer is plain TCP; hosts that need TLS establish
//! the stream themselves and hand it to
//! [`crate::driver::BoltConnection::establish`].

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::config::Config;
use super::error::{DriverError, DriverResult};

/// A connect target: a literal address or a name for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAddr {
    Ip(IpAddr),
    Name(String),
}

impl HostAddr {
    /// Classify `host` without touching the network.
    pub fn parse(host: &str) -> Self {
        match host.parse::<IpAddr>() {
            Ok(ip) => HostAddr::Ip(ip),
            Err(_) => HostAddr::Name(host.to_owned()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, HostAddr::Ip(_))
    }
}

/// Dial the configured endpoint with the connect timeout applied.
pub async fn connect_tcp(config: &Config) -> DriverResult<TcpStream> {
    if config.tls.is_enabled() {
        return Err(DriverError::InvalidInput(
            "built-in transport is plain TCP; establish the TLS stream in the host transport"
                .to_owned(),
        ));
    }

    let target = HostAddr::parse(&config.hostname);
    if config.debug_connect {
        debug!(
            hostname = %config.hostname,
            port = config.port,
            literal = target.is_literal(),
            connect_timeout = ?config.timeout,
            recv_timeout = ?config.recv_timeout,
            "connecting"
        );
    }

    let dial = async {
        let stream = match &target {
            HostAddr::Ip(ip) => TcpStream::connect(SocketAddr::new(*ip, config.port)).await,
            HostAddr::Name(name) => TcpStream::connect((name.as_str(), config.port)).await,
        };
        stream.map_err(|e| {
            DriverError::Connection(format!(
                "failed to connect to {}:{}: {e}",
                config.hostname, config.port
            ))
        })
    };

    let stream = timeout(config.timeout, dial)
        .await
        .map_err(|_| {
            DriverError::Connection(format!(
                "connect to {}:{} timed out after {:?}",
                config.hostname, config.port, config.timeout
            ))
        })??;

    stream.set_nodelay(true).ok();
    Ok(stream)
}
