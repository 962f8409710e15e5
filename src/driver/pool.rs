//! Connection pool.
//!
//! Hands out exclusive leases (`Arc<tokio::sync::Mutex<_>>`) over
//! authenticated connections. Checkin validates health: a `Failed`
//! connection is RESET before re-entering the pool and anything else
//! unhealthy is discarded. A maintenance task pings parked connections
//! every `idle_interval` so sockets closed while idle are detected and
//! dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::breaker::CircuitBreaker;
use super::config::Config;
use super::connection::BoltConnection;
use super::error::{DriverError, DriverResult};

/// A pooled connection lease. The async mutex serializes tasks that
/// share a lease (sandbox shared mode).
pub type SharedConnection = Arc<tokio::sync::Mutex<BoltConnection>>;

/// Why a lease is coming back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinReason {
    /// Normal return to the pool.
    Checkin,
    /// The lease holder saw a connection-class error.
    Disconnect,
    /// The pool is shutting down.
    Stop,
}

/// Lifecycle hooks around checkout and checkin. The sandbox uses these
/// to wrap every lease in a transaction.
#[async_trait]
pub trait LeaseHooks: Send + Sync {
    /// Runs after a connection is checked out, before the caller sees
    /// it. An error discards the connection.
    async fn post_checkout(&self, conn: &mut BoltConnection) -> DriverResult<()>;

    /// Runs before a connection re-enters the pool. An error discards
    /// the connection.
    async fn pre_checkin(
        &self,
        reason: CheckinReason,
        conn: &mut BoltConnection,
    ) -> DriverResult<()>;
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    pub total_created: u64,
    pub total_closed: u64,
    pub total_checkouts: u64,
}

/// Pool of authenticated connections to one endpoint.
pub struct ConnectionPool {
    config: Config,
    breaker: Arc<CircuitBreaker>,
    hooks: RwLock<Option<Arc<dyn LeaseHooks>>>,
    idle: Mutex<VecDeque<SharedConnection>>,
    semaphore: Arc<Semaphore>,
    size: AtomicUsize,
    in_use: AtomicUsize,
    total_created: AtomicU64,
    total_closed: AtomicU64,
    total_checkouts: AtomicU64,
    open: RwLock<bool>,
}

impl ConnectionPool {
    /// Build the pool and start its maintenance task (when called
    /// inside a tokio runtime).
    pub fn new(config: Config) -> Arc<Self> {
        let breaker = Arc::new(CircuitBreaker::new(
            config.failure_threshold,
            config.recovery_timeout,
        ));
        let pool = Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(config.pool_size)),
            breaker,
            hooks: RwLock::new(None),
            idle: Mutex::new(VecDeque::new()),
            size: AtomicUsize::new(0),
            in_use: AtomicUsize::new(0),
            total_created: AtomicU64::new(0),
            total_closed: AtomicU64::new(0),
            total_checkouts: AtomicU64::new(0),
            open: RwLock::new(true),
            config,
        });
        if tokio::runtime::Handle::try_current().is_ok() {
            Self::spawn_maintenance(&pool);
        }
        pool
    }

    /// Install lease hooks. Affects subsequent checkouts/checkins.
    pub fn set_hooks(&self, hooks: Arc<dyn LeaseHooks>) {
        *self.hooks.write() = Some(hooks);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check out an exclusive lease, running `post_checkout` hooks.
    pub async fn checkout(&self) -> DriverResult<SharedConnection> {
        self.checkout_inner(true).await
    }

    /// Check out bypassing the hooks (sandbox auto mode).
    pub async fn checkout_raw(&self) -> DriverResult<SharedConnection> {
        self.checkout_inner(false).await
    }

    async fn checkout_inner(&self, run_hooks: bool) -> DriverResult<SharedConnection> {
        if !*self.open.read() {
            return Err(DriverError::Connection("pool is closed".to_owned()));
        }
        if !self.breaker.allow() {
            return Err(DriverError::Connection(format!(
                "circuit open for {}",
                self.config.endpoint()
            )));
        }

        let conn = match self.pop_idle() {
            Some(conn) => conn,
            None => self.grow().await?,
        };
        self.total_checkouts.fetch_add(1, Ordering::Relaxed);
        self.in_use.fetch_add(1, Ordering::Relaxed);

        if run_hooks {
            let hooks = self.hooks.read().clone();
            if let Some(hooks) = hooks {
                let mut guard = conn.lock().await;
                if let Err(e) = hooks.post_checkout(&mut guard).await {
                    drop(guard);
                    self.in_use.fetch_sub(1, Ordering::Relaxed);
                    self.discard(conn, false).await;
                    return Err(e);
                }
            }
        }
        Ok(conn)
    }

    fn pop_idle(&self) -> Option<SharedConnection> {
        let mut idle = self.idle.lock();
        while let Some(conn) = idle.pop_front() {
            // Idle connections have no other users; a held lock or an
            // unhealthy status means the entry is stale.
            let healthy = conn
                .try_lock()
                .map(|guard| guard.is_healthy())
                .unwrap_or(false);
            if healthy {
                return Some(conn);
            }
            self.size.fetch_sub(1, Ordering::Relaxed);
            self.total_closed.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    async fn grow(&self) -> DriverResult<SharedConnection> {
        let permit = tokio::time::timeout(
            self.config.timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        .map_err(|_| DriverError::Connection("pool checkout timed out".to_owned()))?
        .map_err(|_| DriverError::Connection("pool is closed".to_owned()))?;

        // Another checkin may have parked a connection while we waited.
        if let Some(conn) = self.pop_idle() {
            return Ok(conn);
        }

        let result = BoltConnection::connect(&self.config).await;
        drop(permit);
        match result {
            Ok(conn) => {
                self.breaker.record_success();
                self.size.fetch_add(1, Ordering::Relaxed);
                self.total_created.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::new(tokio::sync::Mutex::new(conn)))
            }
            Err(e) => {
                if e.is_transient() {
                    self.breaker.record_failure();
                }
                Err(e)
            }
        }
    }

    /// Return a lease. Runs `pre_checkin` hooks, then either parks the
    /// connection or discards it.
    pub async fn checkin(&self, conn: SharedConnection, reason: CheckinReason) {
        self.checkin_inner(conn, reason, true).await;
    }

    /// Return a lease bypassing the hooks (sandbox auto mode).
    pub async fn checkin_raw(&self, conn: SharedConnection, reason: CheckinReason) {
        self.checkin_inner(conn, reason, false).await;
    }

    async fn checkin_inner(&self, conn: SharedConnection, reason: CheckinReason, run_hooks: bool) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);

        if run_hooks {
            let hooks = self.hooks.read().clone();
            if let Some(hooks) = hooks {
                let mut guard = conn.lock().await;
                if let Err(e) = hooks.pre_checkin(reason, &mut guard).await {
                    warn!("pre-checkin hook failed, discarding connection: {e}");
                    drop(guard);
                    self.discard(conn, false).await;
                    return;
                }
            }
        }

        let keep = {
            let mut guard = conn.lock().await;
            // A Failed connection must be RESET before it can re-enter
            // the pool; a RESET failure leaves it Defunct.
            if guard.status() == super::connection::ConnectionStatus::Failed {
                let _ = guard.reset().await;
            }
            reason == CheckinReason::Checkin
                && *self.open.read()
                && guard.status() == super::connection::ConnectionStatus::Ready
        };

        if keep {
            self.idle.lock().push_back(conn);
        } else {
            // Deliberate disconnects say GOODBYE; dead sockets do not.
            self.discard(conn, reason == CheckinReason::Disconnect).await;
        }
    }

    async fn discard(&self, conn: SharedConnection, say_goodbye: bool) {
        self.size.fetch_sub(1, Ordering::Relaxed);
        self.total_closed.fetch_add(1, Ordering::Relaxed);
        let mut guard = conn.lock().await;
        if say_goodbye {
            guard.goodbye().await;
        } else {
            guard.mark_defunct();
        }
    }

    /// Checkout + RESET + checkin, to verify the endpoint is reachable
    /// and credentials work.
    pub async fn verify_connectivity(&self) -> DriverResult<()> {
        let conn = self.checkout_raw().await?;
        let outcome = conn.lock().await.reset().await;
        match outcome {
            Ok(()) => {
                self.checkin_raw(conn, CheckinReason::Checkin).await;
                Ok(())
            }
            Err(e) => {
                self.checkin_raw(conn, CheckinReason::Disconnect).await;
                Err(e)
            }
        }
    }

    /// Close the pool and say GOODBYE to parked connections.
    pub async fn close(&self) {
        *self.open.write() = false;
        let parked: Vec<SharedConnection> = self.idle.lock().drain(..).collect();
        for conn in parked {
            self.total_closed.fetch_add(1, Ordering::Relaxed);
            self.size.fetch_sub(1, Ordering::Relaxed);
            conn.lock().await.goodbye().await;
        }
    }

    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            size: self.size.load(Ordering::Relaxed),
            idle: self.idle.lock().len(),
            in_use: self.in_use.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
            total_checkouts: self.total_checkouts.load(Ordering::Relaxed),
        }
    }

    fn spawn_maintenance(pool: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(pool);
        let interval = pool.config.idle_interval.max(Duration::from_millis(100));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(pool) = weak.upgrade() else { return };
                if !pool.is_open() {
                    return;
                }
                pool.sweep_idle().await;
            }
        });
    }

    /// Ping every parked connection; drop the ones that do not answer.
    async fn sweep_idle(&self) {
        let parked: Vec<SharedConnection> = self.idle.lock().drain(..).collect();
        for conn in parked {
            let alive = {
                let mut guard = conn.lock().await;
                guard.ping().await.is_ok()
            };
            if alive {
                self.idle.lock().push_back(conn);
            } else {
                debug!("idle connection failed its keep-alive ping, discarding");
                self.discard(conn, false).await;
            }
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metrics = self.metrics();
        f.debug_struct("ConnectionPool")
            .field("endpoint", &self.config.endpoint())
            .field("size", &metrics.size)
            .field("idle", &metrics.idle)
            .field("in_use", &metrics.in_use)
            .finish()
    }
}
