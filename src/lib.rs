//! # boltline
//!
//! An async client for the Neo4j **Bolt** wire protocol, built on
//! Tokio, with a per-test connection sandbox.
//!
//! ## Layers
//!
//! - **PackStream codec** ([`bolt::packstream`]) — the binary value
//!   format: nulls, ints, floats, strings, lists, maps and the tagged
//!   graph structures (nodes, relationships, paths).
//! - **Messages & versions** ([`bolt::message`], [`bolt::handshake`]) —
//!   version negotiation and the per-version message vocabulary for
//!   Bolt 1 through 5.6.
//! - **Connection** ([`driver::BoltConnection`]) — handshake,
//!   authentication (INIT / HELLO / LOGON by version), queries, result
//!   streaming, transactions with depth-tracked reentrancy, RESET
//!   recovery, pings and GOODBYE.
//! - **Pool & sandbox** ([`driver::ConnectionPool`],
//!   [`driver::SandboxPool`]) — exclusive leases with keep-alive pings
//!   and a circuit breaker, plus an ownership registry that wraps each
//!   test's lease in an auto-rolled-back transaction.
//!
//! ## Running a query
//!
//! ```rust,no_run
//! use boltline::{BoltConnection, Config};
//! use std::collections::HashMap;
//!
//! # async fn example() -> boltline::DriverResult<()> {
//! let config = Config::builder()
//!     .with_hostname("localhost")
//!     .with_basic_auth("neo4j", "password")
//!     .build();
//!
//! let mut conn = BoltConnection::connect(&config).await?;
//! let result = conn
//!     .execute("RETURN $x AS x", HashMap::new(), Default::default())
//!     .await?;
//! for record in result {
//!     println!("{:?}", record.get_by_key("x"));
//! }
//! conn.goodbye().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Sandboxed tests
//!
//! ```rust,no_run
//! use boltline::{AcquireOptions, Config, SandboxPool};
//! use std::collections::HashMap;
//!
//! # async fn example() -> boltline::DriverResult<()> {
//! let sandbox = SandboxPool::new(Config::default());
//!
//! let owner = sandbox.acquire(AcquireOptions::default()).await?;
//! sandbox.run("CREATE (:T {k: 'a'})", HashMap::new()).await?;
//! // Everything above rolls back here.
//! sandbox.release(owner).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod bolt;
pub mod driver;

pub use bolt::{
    AccessMode, AuthToken, BoltError, BoltVersion, GraphStruct, Node, PackStreamError, Path,
    Relationship, Structure, UnboundRelationship, Value,
};
pub use bolt::message::TxExtras;
pub use driver::{
    AcquireOptions, BasicAuth, BoltConnection, CheckinReason, CircuitBreaker, CircuitState,
    Config, ConfigBuilder, ConnectionPool, ConnectionStatus, DriverError, DriverResult,
    OwnerId, OwnershipMode, QueryResult, Record, RetryPolicy, SandboxOwner, SandboxPool,
    ServerHints, TlsMode, with_retry,
};
