//! # Fetcher Crate
//!
//! Fault-tolerant retrieval of candidate flights from the booking API.
//!
//! ## Components
//!
//! - **channel**: `CandidateChannel` trait and the HTTP implementation
//! - **circuit_breaker**: Closed / Open / HalfOpen gate, persisted across restarts
//! - **backoff**: retry budget, exponential backoff and per-attempt timeout
//! - **cancel**: cooperative cancellation token
//! - **fallback**: static sample destinations for degraded mode
//! - **resilient**: `ResilientFetcher`, which ties the above together
//!
//! ## Example Usage
//!
//! ```ignore
//! use fetcher::{CancelToken, HttpCandidateChannel, ResilientFetcher, SharedCircuitBreaker};
//!
//! let channel = Arc::new(HttpCandidateChannel::new("http://localhost:8080/api")?);
//! let breaker = Arc::new(SharedCircuitBreaker::load(storage, CircuitBreaker::new()));
//! let fetcher = ResilientFetcher::new(channel, breaker);
//!
//! let outcome = fetcher.fetch_candidates("LHR", &CancelToken::new()).await;
//! if outcome.is_degraded() {
//!     // showing sample destinations
//! }
//! ```

pub mod error;
pub mod channel;
pub mod circuit_breaker;
pub mod backoff;
pub mod cancel;
pub mod fallback;
pub mod resilient;

pub use backoff::RetryPolicy;
pub use cancel::CancelToken;
pub use channel::{CandidateChannel, HttpCandidateChannel};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerState, CircuitStatus, SharedCircuitBreaker, CIRCUIT_BREAKER_KEY,
};
pub use error::ChannelError;
pub use fallback::fallback_candidates;
pub use resilient::{DegradedReason, FetchOutcome, FetchStatus, ResilientFetcher};
