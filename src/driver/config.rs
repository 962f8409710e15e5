//! Connection and pool configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Basic username/password credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Transport security intent.
///
/// The built-in transport dials plain TCP; TLS session setup belongs to
/// the embedding host, which hands a ready stream to
/// [`crate::driver::BoltConnection::establish`]. The mode is carried so
/// that transports can honor it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsMode {
    /// Plain TCP.
    #[default]
    Disabled,
    /// TLS with explicit transport options.
    Options(Vec<(String, String)>),
    /// TLS without certificate verification.
    VerifyNone,
}

impl TlsMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TlsMode::Disabled)
    }
}

/// Per-connection configuration.
///
/// The embedding host builds this once (its config loader is outside
/// this crate) and hands it to the connection, pool and sandbox layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub hostname: String,
    pub port: u16,
    pub basic_auth: Option<BasicAuth>,
    /// Connect timeout.
    pub timeout: Duration,
    /// Default per-message receive deadline.
    pub recv_timeout: Duration,
    /// Receive deadline used by RESET pings.
    pub ping_timeout: Duration,
    /// How often the pool validates parked connections.
    pub idle_interval: Duration,
    pub pool_size: usize,
    /// How long a sandbox may hold a lease before it is reclaimed.
    pub ownership_timeout: Duration,
    pub tls: TlsMode,
    /// Log connect parameters verbosely.
    pub debug_connect: bool,
    pub user_agent: String,
    /// Routing context sent in HELLO on Bolt 4.1+.
    pub routing_context: Option<HashMap<String, String>>,
    pub notifications_minimum_severity: Option<String>,
    pub notifications_disabled_classifications: Option<Vec<String>>,
    /// Retry policy knobs for [`crate::driver::retry::with_retry`].
    pub max_retries: u32,
    pub retry_base: Duration,
    pub retry_max_delay: Duration,
    pub retry_jitter: bool,
    /// Circuit breaker knobs.
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_owned(),
            port: 7687,
            basic_auth: None,
            timeout: Duration::from_secs(15),
            recv_timeout: Duration::from_secs(15),
            ping_timeout: Duration::from_secs(5),
            idle_interval: Duration::from_secs(1),
            pool_size: 15,
            ownership_timeout: Duration::from_secs(120),
            tls: TlsMode::Disabled,
            debug_connect: false,
            user_agent: concat!("boltline/", env!("CARGO_PKG_VERSION")).to_owned(),
            routing_context: None,
            notifications_minimum_severity: None,
            notifications_disabled_classifications: None,
            max_retries: 3,
            retry_base: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(5),
            retry_jitter: true,
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Endpoint key used for circuit breaker bookkeeping.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = hostname.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.basic_auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.config.recv_timeout = timeout;
        self
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.config.ping_timeout = timeout;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.config.idle_interval = interval;
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    pub fn with_ownership_timeout(mut self, timeout: Duration) -> Self {
        self.config.ownership_timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.config.tls = tls;
        self
    }

    pub fn with_debug_connect(mut self) -> Self {
        self.config.debug_connect = true;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_routing_context(mut self, context: HashMap<String, String>) -> Self {
        self.config.routing_context = Some(context);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.recovery_timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
