//! Connection lifecycle, resilience and the test sandbox.
//!
//! - [`BoltConnection`] drives one socket through handshake,
//!   authentication, queries and transactions.
//! - [`ConnectionPool`] hands out exclusive leases with health checks
//!   and a per-endpoint circuit breaker.
//! - [`SandboxPool`] wraps leases in auto-rolled-back transactions for
//!   isolated tests.

mod breaker;
mod config;
mod connection;
mod error;
mod pool;
mod record;
mod retry;
mod sandbox;
mod transport;

pub use breaker::{BreakerRegistry, CircuitBreaker, CircuitState};
pub use config::{BasicAuth, Config, ConfigBuilder, TlsMode};
pub use connection::{
    BoltConnection, ConnectionStatus, PullOutcome, RoutingTable, ServerHints, StatementHandle,
};
pub use error::{DriverError, DriverResult};
pub use pool::{
    CheckinReason, ConnectionPool, LeaseHooks, PoolMetrics, SharedConnection,
};
pub use record::{QueryResult, Record};
pub use retry::{with_retry, RetryPolicy};
pub use sandbox::{AcquireOptions, OwnerId, OwnershipMode, SandboxOwner, SandboxPool};
pub use transport::{connect_tcp, HostAddr};
