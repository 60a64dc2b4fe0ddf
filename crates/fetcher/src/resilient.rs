//! Fault-tolerant candidate retrieval.
//!
//! ## Algorithm
//! 1. Breaker refuses: serve the fallback set, no network access
//! 2. Attempt up to `max_retries + 1` times, waiting the backoff delay
//!    before every attempt after the first
//! 3. Each attempt is bounded by `attempt_timeout`
//! 4. Cancellation aborts the attempt or the backoff wait and stops
//! 5. Success: `record_success`, return live data
//! 6. Connectivity failure: `record_failure`, retry unless the breaker opened;
//!    any other failure is surfaced at once without retrying
//! 7. Out of attempts: serve the fallback set
//!
//! A retrieval failure never escapes as an error. The outcome is live data,
//! degraded (fallback) data, or a cancellation.

use crate::backoff::RetryPolicy;
use crate::cancel::CancelToken;
use crate::channel::CandidateChannel;
use crate::circuit_breaker::{CircuitStatus, SharedCircuitBreaker};
use crate::error::ChannelError;
use crate::fallback::fallback_candidates;
use chrono::Utc;
use flight_data::parser::normalize_code;
use flight_data::{AirportCode, CandidateFlight};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Why fallback data was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// Breaker was open before we started; nothing was sent
    CircuitOpen,
    /// Breaker opened during this retrieval
    CircuitTripped { last_error: ChannelError },
    /// Every attempt failed with a connectivity error
    RetriesExhausted { last_error: ChannelError },
    /// The channel answered with a non-retryable error
    Rejected(ChannelError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Live,
    Degraded(DegradedReason),
    Cancelled,
}

/// Result of one logical retrieval.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub origin: AirportCode,
    pub status: FetchStatus,
    pub candidates: Vec<CandidateFlight>,
    /// Network attempts actually issued
    pub attempts: u32,
}

impl FetchOutcome {
    pub fn is_live(&self) -> bool {
        self.status == FetchStatus::Live
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, FetchStatus::Degraded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == FetchStatus::Cancelled
    }
}

/// Retrieval with retries, backoff, timeouts, cancellation and a breaker.
#[derive(Clone)]
pub struct ResilientFetcher {
    channel: Arc<dyn CandidateChannel>,
    breaker: Arc<SharedCircuitBreaker>,
    policy: RetryPolicy,
}

impl ResilientFetcher {
    pub fn new(channel: Arc<dyn CandidateChannel>, breaker: Arc<SharedCircuitBreaker>) -> Self {
        Self {
            channel,
            breaker,
            policy: RetryPolicy::default(),
        }
    }

    /// Configure retries, backoff and timeout (default: `RetryPolicy::default()`)
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn breaker(&self) -> &Arc<SharedCircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch candidate flights departing from `origin`.
    #[instrument(skip(self, cancel), fields(channel = self.channel.name()))]
    pub async fn fetch_candidates(&self, origin: &str, cancel: &CancelToken) -> FetchOutcome {
        let origin = normalize_code(origin);

        if cancel.is_cancelled() {
            return self.cancelled(origin, 0);
        }
        if !self.breaker.can_proceed() {
            info!("Circuit open, serving sample destinations for {}", origin);
            return self.degraded(origin, DegradedReason::CircuitOpen, 0);
        }

        let mut attempts = 0;
        let mut last_error = ChannelError::Timeout;

        for attempt in 0..self.policy.total_attempts() {
            if attempt > 0 {
                let delay = self.policy.backoff_delay(attempt);
                debug!("Retry {} for {} in {:?}", attempt, origin, delay);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return self.cancelled(origin, attempts),
                    _ = tokio::time::sleep(delay) => {}
                }
                if !self.breaker.can_proceed() {
                    return self.degraded(
                        origin,
                        DegradedReason::CircuitTripped { last_error },
                        attempts,
                    );
                }
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(origin, attempts),
                result = tokio::time::timeout(self.policy.attempt_timeout, self.channel.fetch(&origin)) => {
                    result.unwrap_or(Err(ChannelError::Timeout))
                }
            };

            match result {
                Ok(candidates) => {
                    self.breaker.record_success();
                    info!(
                        "Fetched {} candidates for {} after {} attempt(s)",
                        candidates.len(),
                        origin,
                        attempts
                    );
                    return FetchOutcome {
                        origin,
                        status: FetchStatus::Live,
                        candidates,
                        attempts,
                    };
                }
                Err(e) if e.is_connectivity() => {
                    warn!("Attempt {} for {} failed: {}", attempt, origin, e);
                    self.breaker.record_failure();
                    if self.breaker.status() == CircuitStatus::Open {
                        return self.degraded(
                            origin,
                            DegradedReason::CircuitTripped { last_error: e },
                            attempts,
                        );
                    }
                    last_error = e;
                }
                Err(e) => {
                    warn!("Booking API refused request for {}: {}", origin, e);
                    return self.degraded(origin, DegradedReason::Rejected(e), attempts);
                }
            }
        }

        warn!("Giving up on {} after {} attempts", origin, attempts);
        self.degraded(origin, DegradedReason::RetriesExhausted { last_error }, attempts)
    }

    fn degraded(&self, origin: AirportCode, reason: DegradedReason, attempts: u32) -> FetchOutcome {
        let candidates = fallback_candidates(&origin, Utc::now().date_naive());
        FetchOutcome {
            origin,
            status: FetchStatus::Degraded(reason),
            candidates,
            attempts,
        }
    }

    fn cancelled(&self, origin: AirportCode, attempts: u32) -> FetchOutcome {
        debug!("Fetch for {} cancelled", origin);
        FetchOutcome {
            origin,
            status: FetchStatus::Cancelled,
            candidates: Vec::new(),
            attempts,
        }
    }
}
