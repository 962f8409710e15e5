//! Per-test connection sandbox.
//!
//! Each owner checks out one pooled connection wrapped in a
//! transaction: BEGIN runs on checkout, ROLLBACK on checkin, so
//! everything a test writes disappears when its lease is released.
//! Nested transactions started by code under test collapse into depth
//! bumps on the connection (servers have no savepoints), which makes
//! user-level commits inside a sandbox no-ops.
//!
//! Owners are task ids. Tokio exposes no caller chain, so inheritance
//! for spawned children goes through an ambient task-local scope
//! ([`SandboxPool::scope`]) or an explicit [`SandboxPool::allow`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bolt::message::TxExtras;
use crate::bolt::packstream::Value;

use super::config::Config;
use super::connection::BoltConnection;
use super::error::{DriverError, DriverResult};
use super::pool::{CheckinReason, ConnectionPool, LeaseHooks, SharedConnection};
use super::record::QueryResult;

tokio::task_local! {
    static AMBIENT_OWNER: OwnerId;
}

/// Identity of a lease owner: the tokio task that acquired it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(tokio::task::Id);

impl OwnerId {
    /// The calling task's identity, when running inside a task.
    pub fn current() -> Option<Self> {
        tokio::task::try_id().map(OwnerId)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// How unowned requests are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipMode {
    /// Requests from non-owners fail.
    #[default]
    Manual,
    /// Requests without an owner check a connection out per operation,
    /// with no sandbox transaction (no isolation).
    Auto,
    /// All unowned requests route to this owner's connection.
    Shared(OwnerId),
}

/// Options for [`SandboxPool::acquire`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AcquireOptions {
    /// Switch the pool to shared mode with this owner.
    pub shared: bool,
    /// Override the configured lease timeout.
    pub ownership_timeout: Option<Duration>,
}

struct OwnerEntry {
    lease: SharedConnection,
    allowed: HashSet<OwnerId>,
    acquired_at: Instant,
    timeout: Duration,
}

#[derive(Default)]
struct Registry {
    mode: OwnershipMode,
    owners: HashMap<OwnerId, OwnerEntry>,
}

/// BEGIN-on-checkout / ROLLBACK-on-checkin.
struct TransactionHooks;

#[async_trait]
impl LeaseHooks for TransactionHooks {
    async fn post_checkout(&self, conn: &mut BoltConnection) -> DriverResult<()> {
        conn.begin(TxExtras::default()).await
    }

    async fn pre_checkin(
        &self,
        reason: CheckinReason,
        conn: &mut BoltConnection,
    ) -> DriverResult<()> {
        match reason {
            // A rollback failure leaves the transaction state unknown;
            // the error makes the pool replace the connection.
            CheckinReason::Checkin => conn.rollback().await,
            CheckinReason::Disconnect | CheckinReason::Stop => Ok(()),
        }
    }
}

/// A held sandbox lease. Release it explicitly with
/// [`SandboxPool::release`]; if the guard is dropped instead (the
/// owning task exited or panicked), a background reaper runs the
/// checkin.
#[must_use = "the sandbox lease is released when this guard goes away"]
pub struct SandboxOwner {
    id: OwnerId,
    reaper: mpsc::UnboundedSender<OwnerId>,
    armed: bool,
}

impl SandboxOwner {
    pub fn id(&self) -> OwnerId {
        self.id
    }
}

impl fmt::Debug for SandboxOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxOwner").field("id", &self.id).finish()
    }
}

impl Drop for SandboxOwner {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.reaper.send(self.id);
        }
    }
}

enum Resolution {
    Lease(SharedConnection),
    AutoCheckout,
    NotOwned,
}

/// Ownership-gated pool for test isolation.
pub struct SandboxPool {
    pool: Arc<ConnectionPool>,
    registry: Mutex<Registry>,
    reaper_tx: mpsc::UnboundedSender<OwnerId>,
}

impl SandboxPool {
    pub fn new(config: Config) -> Arc<Self> {
        let pool = ConnectionPool::new(config);
        pool.set_hooks(Arc::new(TransactionHooks));

        let (reaper_tx, reaper_rx) = mpsc::unbounded_channel();
        let sandbox = Arc::new(Self {
            pool,
            registry: Mutex::new(Registry::default()),
            reaper_tx,
        });
        if tokio::runtime::Handle::try_current().is_ok() {
            Self::spawn_reaper(&sandbox, reaper_rx);
            Self::spawn_expiry_sweep(&sandbox);
        }
        sandbox
    }

    pub fn set_mode(&self, mode: OwnershipMode) {
        self.registry.lock().mode = mode;
    }

    pub fn mode(&self) -> OwnershipMode {
        self.registry.lock().mode
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Check out a connection for the calling task and open its
    /// sandbox transaction. Returns once BEGIN has completed.
    pub async fn acquire(&self, opts: AcquireOptions) -> DriverResult<SandboxOwner> {
        let id = OwnerId::current().ok_or_else(|| {
            DriverError::InvalidInput("sandbox acquire outside a tokio task".to_owned())
        })?;
        if self.registry.lock().owners.contains_key(&id) {
            return Err(DriverError::InvalidInput(format!(
                "{id} already owns a sandbox connection"
            )));
        }

        let lease = self.pool.checkout().await?;
        let timeout = opts
            .ownership_timeout
            .unwrap_or(self.pool.config().ownership_timeout);

        let mut registry = self.registry.lock();
        registry.owners.insert(
            id,
            OwnerEntry {
                lease,
                allowed: HashSet::new(),
                acquired_at: Instant::now(),
                timeout,
            },
        );
        if opts.shared {
            registry.mode = OwnershipMode::Shared(id);
        }
        drop(registry);

        debug!(%id, shared = opts.shared, "sandbox acquired");
        Ok(SandboxOwner {
            id,
            reaper: self.reaper_tx.clone(),
            armed: true,
        })
    }

    /// Roll the sandbox transaction back and return the connection.
    /// Returns once ROLLBACK (and the checkin) has completed.
    pub async fn release(&self, mut owner: SandboxOwner) -> DriverResult<()> {
        owner.armed = false;
        let id = owner.id;
        drop(owner);
        self.release_id(id).await
    }

    async fn release_id(&self, id: OwnerId) -> DriverResult<()> {
        let entry = {
            let mut registry = self.registry.lock();
            if registry.mode == OwnershipMode::Shared(id) {
                registry.mode = OwnershipMode::Manual;
            }
            registry.owners.remove(&id)
        };
        let entry = entry.ok_or_else(|| {
            DriverError::InvalidInput(format!("{id} does not own a sandbox connection"))
        })?;
        self.pool.checkin(entry.lease, CheckinReason::Checkin).await;
        debug!(%id, "sandbox released");
        Ok(())
    }

    /// Grant `child` the right to route requests through `owner`'s
    /// connection.
    pub fn allow(&self, owner: OwnerId, child: OwnerId) -> DriverResult<()> {
        let mut registry = self.registry.lock();
        let entry = registry.owners.get_mut(&owner).ok_or_else(|| {
            DriverError::InvalidInput(format!("{owner} does not own a sandbox connection"))
        })?;
        entry.allowed.insert(child);
        Ok(())
    }

    /// Run `fut` with `owner`'s lease ambiently visible, so futures
    /// composed inside it inherit the ownership without an explicit
    /// [`Self::allow`]. Tasks spawned onto the runtime do not carry
    /// task-locals; grant those with [`Self::allow`].
    pub async fn scope<F>(owner: OwnerId, fut: F) -> F::Output
    where
        F: Future,
    {
        AMBIENT_OWNER.scope(owner, fut).await
    }

    fn resolve(&self) -> Resolution {
        let current = OwnerId::current();
        let ambient = AMBIENT_OWNER.try_with(|o| *o).ok();
        let registry = self.registry.lock();

        if let Some(id) = current {
            if let Some(entry) = registry.owners.get(&id) {
                return Resolution::Lease(Arc::clone(&entry.lease));
            }
        }
        if let Some(id) = ambient {
            if let Some(entry) = registry.owners.get(&id) {
                return Resolution::Lease(Arc::clone(&entry.lease));
            }
        }
        if let Some(id) = current {
            for entry in registry.owners.values() {
                if entry.allowed.contains(&id) {
                    return Resolution::Lease(Arc::clone(&entry.lease));
                }
            }
        }
        match registry.mode {
            OwnershipMode::Shared(owner) => match registry.owners.get(&owner) {
                Some(entry) => Resolution::Lease(Arc::clone(&entry.lease)),
                None => Resolution::NotOwned,
            },
            OwnershipMode::Auto => Resolution::AutoCheckout,
            OwnershipMode::Manual => Resolution::NotOwned,
        }
    }

    /// Execute a statement on the connection the caller is entitled
    /// to. Inside a sandbox this runs within the lease transaction.
    pub async fn run(
        &self,
        query: impl Into<String>,
        parameters: HashMap<String, Value>,
    ) -> DriverResult<QueryResult> {
        match self.resolve() {
            Resolution::Lease(lease) => {
                let mut conn = lease.lock().await;
                conn.execute(query, parameters, TxExtras::default()).await
            }
            Resolution::AutoCheckout => {
                let lease = self.pool.checkout_raw().await?;
                let result = {
                    let mut conn = lease.lock().await;
                    conn.execute(query, parameters, TxExtras::default()).await
                };
                let reason = match &result {
                    Err(e) if e.is_connection_error() => CheckinReason::Disconnect,
                    _ => CheckinReason::Checkin,
                };
                self.pool.checkin_raw(lease, reason).await;
                result
            }
            Resolution::NotOwned => Err(DriverError::InvalidInput(
                "no sandbox ownership for this task (acquire, allow or shared mode required)"
                    .to_owned(),
            )),
        }
    }

    /// User-level BEGIN. Inside a sandbox this only bumps the
    /// transaction depth; nothing reaches the wire.
    pub async fn begin(&self) -> DriverResult<()> {
        let lease = self.owned_lease()?;
        let mut conn = lease.lock().await;
        conn.begin(TxExtras::default()).await
    }

    /// User-level COMMIT, collapsing to a depth decrement inside a
    /// sandbox.
    pub async fn commit(&self) -> DriverResult<Option<String>> {
        let lease = self.owned_lease()?;
        let mut conn = lease.lock().await;
        conn.commit().await
    }

    /// User-level ROLLBACK, collapsing to a depth decrement inside a
    /// sandbox.
    pub async fn rollback(&self) -> DriverResult<()> {
        let lease = self.owned_lease()?;
        let mut conn = lease.lock().await;
        conn.rollback().await
    }

    /// Transaction-function helper: BEGIN, run `work`, COMMIT (or
    /// ROLLBACK on error). Inside a sandbox the whole thing collapses
    /// into the lease transaction.
    pub async fn transaction<F, Fut, T>(&self, work: F) -> DriverResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        self.begin().await?;
        match work().await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!("rollback after failed transaction work: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    fn owned_lease(&self) -> DriverResult<SharedConnection> {
        match self.resolve() {
            Resolution::Lease(lease) => Ok(lease),
            _ => Err(DriverError::InvalidInput(
                "no sandbox ownership for this task".to_owned(),
            )),
        }
    }

    /// Release every owner and close the pool.
    pub async fn shutdown(&self) {
        let ids: Vec<OwnerId> = self.registry.lock().owners.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.release_id(id).await {
                warn!("release during shutdown: {e}");
            }
        }
        self.pool.close().await;
    }

    fn spawn_reaper(sandbox: &Arc<Self>, mut rx: mpsc::UnboundedReceiver<OwnerId>) {
        let weak: Weak<Self> = Arc::downgrade(sandbox);
        tokio::spawn(async move {
            while let Some(id) = rx.recv().await {
                let Some(sandbox) = weak.upgrade() else { return };
                debug!(%id, "reaping dropped sandbox owner");
                if let Err(e) = sandbox.release_id(id).await {
                    debug!("reap of {id}: {e}");
                }
            }
        });
    }

    fn spawn_expiry_sweep(sandbox: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(sandbox);
        let interval = sandbox.pool.config().idle_interval.max(Duration::from_millis(250));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(sandbox) = weak.upgrade() else { return };
                let expired: Vec<OwnerId> = {
                    let registry = sandbox.registry.lock();
                    registry
                        .owners
                        .iter()
                        .filter(|(_, entry)| entry.acquired_at.elapsed() >= entry.timeout)
                        .map(|(id, _)| *id)
                        .collect()
                };
                for id in expired {
                    warn!(%id, "sandbox lease exceeded its ownership timeout, reclaiming");
                    if let Err(e) = sandbox.release_id(id).await {
                        debug!("reclaim of {id}: {e}");
                    }
                }
            }
        });
    }
}

impl fmt::Debug for SandboxPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("SandboxPool")
            .field("mode", &registry.mode)
            .field("owners", &registry.owners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> Config {
        Config::builder()
            .with_hostname("127.0.0.1")
            .with_port(1)
            .build()
    }

    #[tokio::test]
    async fn owner_id_is_the_task_id() {
        let here = OwnerId::current().unwrap();
        let there = tokio::spawn(async { OwnerId::current().unwrap() })
            .await
            .unwrap();
        assert_ne!(here, there);
        assert_eq!(here, OwnerId::current().unwrap());
    }

    #[tokio::test]
    async fn manual_mode_rejects_unowned_requests() {
        let sandbox = SandboxPool::new(offline_config());
        let err = sandbox.run("RETURN 1", HashMap::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn mode_switches() {
        let sandbox = SandboxPool::new(offline_config());
        assert_eq!(sandbox.mode(), OwnershipMode::Manual);
        sandbox.set_mode(OwnershipMode::Auto);
        assert_eq!(sandbox.mode(), OwnershipMode::Auto);
    }

    #[tokio::test]
    async fn allow_requires_an_owner() {
        let sandbox = SandboxPool::new(offline_config());
        let a = OwnerId::current().unwrap();
        let b = tokio::spawn(async { OwnerId::current().unwrap() })
            .await
            .unwrap();
        assert!(matches!(
            sandbox.allow(a, b),
            Err(DriverError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn ambient_scope_is_inherited_by_nested_futures() {
        let owner = tokio::spawn(async { OwnerId::current().unwrap() })
            .await
            .unwrap();
        let seen = SandboxPool::scope(owner, async {
            AMBIENT_OWNER.try_with(|o| *o).ok()
        })
        .await;
        assert_eq!(seen, Some(owner));
        assert!(AMBIENT_OWNER.try_with(|o| *o).is_err());
    }

    #[tokio::test]
    async fn user_transaction_helpers_require_ownership() {
        let sandbox = SandboxPool::new(offline_config());
        assert!(sandbox.begin().await.is_err());
        assert!(sandbox.commit().await.is_err());
        assert!(sandbox.rollback().await.is_err());
    }
}
