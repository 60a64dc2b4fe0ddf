//! Circuit breaker for the candidate retrieval channel.
//!
//! ```text
//! Closed    -> Open      failure_count >= failure_threshold
//! Open      -> HalfOpen  lazily, on can_proceed(), once reset_timeout elapsed
//! HalfOpen  -> Closed    next success
//! HalfOpen  -> Open      next failure (immediately, no threshold)
//! ```
//!
//! `CircuitBreaker` is plain bookkeeping. `SharedCircuitBreaker` wraps it
//! for use from the fetcher and persists every state change.

use chrono::{DateTime, TimeDelta, Utc};
use flight_data::KeyValueStore;
use flight_data::storage::{load_record, save_record};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

/// Storage key for the persisted breaker state
pub const CIRCUIT_BREAKER_KEY: &str = "circuit_breaker";

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

/// Serializable breaker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerState {
    pub status: CircuitStatus,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub reset_timeout_ms: u64,
    pub failure_threshold: u32,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            status: CircuitStatus::Closed,
            failure_count: 0,
            last_failure_time: None,
            reset_timeout_ms: DEFAULT_RESET_TIMEOUT.as_millis() as u64,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    state: CircuitBreakerState,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: CircuitBreakerState {
                failure_threshold: failure_threshold.max(1),
                reset_timeout_ms: reset_timeout.as_millis() as u64,
                ..CircuitBreakerState::default()
            },
        }
    }

    pub fn from_state(state: CircuitBreakerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &CircuitBreakerState {
        &self.state
    }

    pub fn status(&self) -> CircuitStatus {
        self.state.status
    }

    pub fn can_proceed(&mut self) -> bool {
        self.can_proceed_at(Utc::now())
    }

    /// Whether a new attempt is allowed at `now`.
    ///
    /// Evaluates the lazy `Open -> HalfOpen` transition as a side effect.
    pub fn can_proceed_at(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.status {
            CircuitStatus::Closed | CircuitStatus::HalfOpen => true,
            CircuitStatus::Open => {
                // A timeout past TimeDelta's range never elapses
                let reset_timeout = i64::try_from(self.state.reset_timeout_ms)
                    .ok()
                    .and_then(TimeDelta::try_milliseconds);
                let elapsed = match (self.state.last_failure_time, reset_timeout) {
                    (None, _) => true,
                    (Some(last), Some(timeout)) => now - last > timeout,
                    (Some(_), None) => false,
                };
                if elapsed {
                    self.state.status = CircuitStatus::HalfOpen;
                    info!("Circuit breaker half-open, letting retrieval attempts through");
                }
                elapsed
            }
        }
    }

    pub fn record_success(&mut self) {
        self.state.failure_count = 0;
        if self.state.status == CircuitStatus::HalfOpen {
            self.state.status = CircuitStatus::Closed;
            info!("Circuit breaker closed, retrieval channel recovered");
        }
    }

    pub fn record_failure(&mut self) {
        self.record_failure_at(Utc::now());
    }

    pub fn record_failure_at(&mut self, now: DateTime<Utc>) {
        self.state.failure_count = self.state.failure_count.saturating_add(1);
        self.state.last_failure_time = Some(now);

        let trip = match self.state.status {
            CircuitStatus::HalfOpen => true,
            CircuitStatus::Closed => self.state.failure_count >= self.state.failure_threshold,
            CircuitStatus::Open => false,
        };
        if trip {
            self.state.status = CircuitStatus::Open;
            warn!(
                failures = self.state.failure_count,
                "Circuit breaker opened, skipping retrieval for {}ms", self.state.reset_timeout_ms
            );
        }
    }

    /// Force the breaker back to a clean `Closed` state.
    pub fn reset(&mut self) {
        self.state.status = CircuitStatus::Closed;
        self.state.failure_count = 0;
        self.state.last_failure_time = None;
    }
}

// =============================================================================
// Shared, persisted breaker
// =============================================================================

/// Process-wide breaker for one retrieval channel.
///
/// Every state change is written through to the key-value store when one is
/// configured. Write failures are logged and otherwise ignored.
pub struct SharedCircuitBreaker {
    breaker: Mutex<CircuitBreaker>,
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl SharedCircuitBreaker {
    pub fn in_memory(breaker: CircuitBreaker) -> Self {
        Self {
            breaker: Mutex::new(breaker),
            storage: None,
        }
    }

    /// Restore the breaker from storage, keeping the configured limits.
    pub fn load(storage: Arc<dyn KeyValueStore>, defaults: CircuitBreaker) -> Self {
        let limits = defaults.state().clone();
        let breaker = match load_record::<CircuitBreakerState>(storage.as_ref(), CIRCUIT_BREAKER_KEY)
        {
            Ok(Some(stored)) => {
                info!(status = ?stored.status, failures = stored.failure_count, "Restored circuit breaker");
                CircuitBreaker::from_state(CircuitBreakerState {
                    reset_timeout_ms: limits.reset_timeout_ms,
                    failure_threshold: limits.failure_threshold,
                    ..stored
                })
            }
            Ok(None) => defaults,
            Err(e) => {
                warn!("Ignoring stored circuit breaker state: {}", e);
                defaults
            }
        };

        Self {
            breaker: Mutex::new(breaker),
            storage: Some(storage),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Apply `op` and persist the state if it changed.
    fn update<T>(&self, op: impl FnOnce(&mut CircuitBreaker) -> T) -> T {
        let (result, changed) = {
            let mut breaker = self.lock();
            let before = breaker.state().clone();
            let result = op(&mut breaker);
            let after = breaker.state().clone();
            (result, (before != after).then_some(after))
        };

        if let (Some(state), Some(storage)) = (changed, self.storage.as_ref()) {
            if let Err(e) = save_record(storage.as_ref(), CIRCUIT_BREAKER_KEY, &state) {
                warn!("Failed to persist circuit breaker state: {}", e);
            }
        }
        result
    }

    pub fn can_proceed(&self) -> bool {
        self.update(|b| b.can_proceed())
    }

    pub fn can_proceed_at(&self, now: DateTime<Utc>) -> bool {
        self.update(|b| b.can_proceed_at(now))
    }

    pub fn record_success(&self) {
        self.update(|b| b.record_success())
    }

    pub fn record_failure(&self) {
        self.update(|b| b.record_failure())
    }

    pub fn reset(&self) {
        self.update(|b| b.reset())
    }

    pub fn status(&self) -> CircuitStatus {
        self.lock().status()
    }

    pub fn snapshot(&self) -> CircuitBreakerState {
        self.lock().state().clone()
    }
}
