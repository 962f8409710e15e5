//! Per-endpoint circuit breaker.
//!
//! Three states. Closed: requests pass and consecutive failures are
//! counted. Open: requests are refused until `recovery_timeout` has
//! elapsed since the last failure, then one probe is let through
//! (half-open). A half-open failure reopens immediately; any success
//! closes the circuit and clears the count.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
}

/// Circuit breaker for one endpoint.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                last_success: None,
            }),
        }
    }

    /// Whether an outbound attempt may proceed. An open circuit whose
    /// recovery timeout has elapsed transitions to half-open and lets
    /// the probe through.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or(self.recovery_timeout);
                if elapsed >= self.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    info!("circuit half-open, letting a probe through");
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a success: the circuit closes and the count clears.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!("circuit closed after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_success = Some(Instant::now());
    }

    /// Record a transient failure. Reaching the threshold opens the
    /// circuit; any half-open failure reopens it immediately.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.last_failure = Some(Instant::now());
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    warn!(
                        failures = inner.failure_count,
                        "circuit opened after consecutive failures"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                warn!("circuit reopened by half-open failure");
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.inner.lock().last_success
    }
}

/// Shared breakers keyed by `host:port`.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &self,
        endpoint: &str,
        failure_threshold: u32,
        recovery_timeout: Duration,
    ) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(endpoint.to_owned())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(failure_threshold, recovery_timeout))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_millis(50))
    }

    #[test]
    fn starts_closed_and_allows() {
        let cb = breaker();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow());
    }

    #[test]
    fn opens_at_threshold_and_blocks() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow());
    }

    #[test]
    fn recovery_timeout_half_opens() {
        let cb = breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(!cb.allow());
        std::thread::sleep(Duration::from_millis(60));
        assert!(cb.allow());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let cb = breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(cb.allow());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow());
    }

    #[test]
    fn success_resets_to_closed_with_zero_count() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);

        // Also from half-open.
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(cb.allow());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.last_success().is_some());
    }

    #[test]
    fn registry_shares_per_endpoint() {
        let registry = BreakerRegistry::new();
        let a1 = registry.get_or_create("a:7687", 3, Duration::from_secs(1));
        let a2 = registry.get_or_create("a:7687", 3, Duration::from_secs(1));
        let b = registry.get_or_create("b:7687", 3, Duration::from_secs(1));
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
