//! # Nearby Flights Orchestrator
//!
//! Coordinates one "nearby flights" request end to end:
//! 1. Guard against duplicate fetches for the same origin
//! 2. Cancel the in-flight fetch when the origin changes
//! 3. Fetch candidates through the resilient fetcher (live or fallback)
//! 4. Take a fresh preference snapshot
//! 5. Score and select with the recommendation engine
//! 6. Return the ranked list with a degraded flag and notice
//!
//! User interactions (clicks, searches, feedback) are routed back into the
//! preference store, which shapes the next pass.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use fetcher::{
    CancelToken, CandidateChannel, CircuitBreakerState, FetchStatus, HttpCandidateChannel,
    ResilientFetcher, SharedCircuitBreaker,
};
use flight_data::parser::normalize_code;
use flight_data::{
    AirportCode, CandidateFlight, DestinationIndex, JsonFileStore, KeyValueStore, OriginContext,
    Season,
};
use pipeline::RecommendationEngine;
use preferences::{FeedbackKind, PreferenceStore, SearchEvent, UserPreferences};

use crate::config::AppConfig;

/// Shown alongside fallback results
pub const SAMPLE_NOTICE: &str = "Showing sample destinations";

/// Ranked result for one origin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyFlights {
    pub origin: OriginContext,
    pub flights: Vec<CandidateFlight>,
    /// Results come from the static fallback set
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// What the orchestrator is doing right now.
#[derive(Debug)]
enum FetchPhase {
    Idle,
    Fetching {
        origin: AirportCode,
        token: CancelToken,
        generation: u64,
    },
}

/// Main orchestrator wiring fetcher, preferences and engine together
pub struct NearbyFlightsOrchestrator {
    fetcher: ResilientFetcher,
    engine: RecommendationEngine,
    preferences: Arc<PreferenceStore>,
    phase: Mutex<FetchPhase>,
    generation: AtomicU64,
    season: Option<Season>,
}

impl NearbyFlightsOrchestrator {
    pub fn new(
        fetcher: ResilientFetcher,
        engine: RecommendationEngine,
        preferences: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            fetcher,
            engine,
            preferences,
            phase: Mutex::new(FetchPhase::Idle),
            generation: AtomicU64::new(0),
            season: None,
        }
    }

    /// Build the production stack: HTTP channel, file-backed storage,
    /// persisted breaker, built-in destination table.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&data_dir));
        info!("Using data directory {}", data_dir.display());

        let channel = HttpCandidateChannel::new(config.api_base_url.clone())
            .context("Failed to build HTTP channel")?;
        Ok(Self::with_channel(config, Arc::new(channel), storage))
    }

    /// Same as `from_config`, with the retrieval channel and storage supplied.
    pub fn with_channel(
        config: &AppConfig,
        channel: Arc<dyn CandidateChannel>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let index = Arc::new(DestinationIndex::builtin());
        let breaker = Arc::new(SharedCircuitBreaker::load(
            storage.clone(),
            config.circuit_breaker(),
        ));
        let fetcher = ResilientFetcher::new(channel, breaker).with_policy(config.retry_policy());
        let preferences = Arc::new(
            PreferenceStore::open(storage, index.clone())
                .with_reanalyze_delay(config.reanalyze_delay()),
        );
        let engine = RecommendationEngine::new(index).with_limit(config.recommendation_limit);
        Self::new(fetcher, engine, preferences)
    }

    /// Pin the season used for scoring (default: the current one).
    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    /// Fetch and rank flights departing from `origin`.
    ///
    /// Returns `Ok(None)` when the call was ignored (a fetch for the same
    /// origin is already in flight) or superseded by a newer origin.
    pub async fn load_nearby(&self, origin: &OriginContext) -> Result<Option<NearbyFlights>> {
        let start = Instant::now();
        let code = normalize_code(&origin.code);

        let Some((token, generation)) = self.begin_fetch(&code) else {
            return Ok(None);
        };

        let outcome = self.fetcher.fetch_candidates(&code, &token).await;
        self.end_fetch(generation);

        let degraded = match &outcome.status {
            FetchStatus::Cancelled => {
                debug!("Fetch for {} superseded", code);
                return Ok(None);
            }
            FetchStatus::Degraded(reason) => {
                info!("Serving fallback for {}: {:?}", code, reason);
                true
            }
            FetchStatus::Live => false,
        };

        let snapshot = self.preferences.snapshot();
        let flights = self
            .engine
            .recommend(outcome.candidates, &snapshot, self.season())
            .context("Recommendation pass failed")?;

        info!(
            "{} recommendations for {} ({}) in {:.2?}",
            flights.len(),
            code,
            if degraded { "fallback" } else { "live" },
            start.elapsed()
        );

        Ok(Some(NearbyFlights {
            origin: OriginContext {
                code,
                city: origin.city.clone(),
                country: origin.country.clone(),
            },
            flights,
            degraded,
            notice: degraded.then(|| SAMPLE_NOTICE.to_string()),
        }))
    }

    /// Whether a fetch is currently in flight
    pub fn is_fetching(&self) -> bool {
        matches!(*self.lock_phase(), FetchPhase::Fetching { .. })
    }

    /// Cancel the in-flight fetch, if any.
    pub fn cancel(&self) {
        let mut phase = self.lock_phase();
        if let FetchPhase::Fetching { origin, token, .. } = &*phase {
            info!("Cancelling fetch for {}", origin);
            token.cancel();
        }
        *phase = FetchPhase::Idle;
    }

    pub fn record_click(&self, destination_code: &str) {
        self.preferences.record_click(destination_code);
    }

    pub fn record_feedback(&self, destination_code: &str, kind: FeedbackKind) {
        self.preferences.record_feedback(destination_code, kind);
    }

    pub fn record_search(&self, event: SearchEvent) {
        self.preferences.record_search(event);
    }

    pub fn preferences(&self) -> UserPreferences {
        self.preferences.snapshot()
    }

    pub fn preference_store(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    pub fn breaker_state(&self) -> CircuitBreakerState {
        self.fetcher.breaker().snapshot()
    }

    pub fn reset_breaker(&self) {
        self.fetcher.breaker().reset();
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Commit pending preference work and stop background tasks.
    pub fn shutdown(&self) {
        self.cancel();
        self.preferences.flush();
        self.preferences.shutdown();
    }

    fn season(&self) -> Season {
        self.season.unwrap_or_else(Season::current)
    }

    fn lock_phase(&self) -> MutexGuard<'_, FetchPhase> {
        self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Move to `Fetching`, or return `None` if this origin is already being
    /// fetched.
    fn begin_fetch(&self, code: &str) -> Option<(CancelToken, u64)> {
        let mut phase = self.lock_phase();
        if let FetchPhase::Fetching { origin, token, .. } = &*phase {
            if origin == code {
                debug!("Fetch for {} already in flight, ignoring", code);
                return None;
            }
            info!("Origin changed {} -> {}, cancelling previous fetch", origin, code);
            token.cancel();
        }

        let token = CancelToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        *phase = FetchPhase::Fetching {
            origin: code.to_string(),
            token: token.clone(),
            generation,
        };
        Some((token, generation))
    }

    /// Back to `Idle`, unless a newer fetch has taken over.
    fn end_fetch(&self, generation: u64) {
        let mut phase = self.lock_phase();
        if let FetchPhase::Fetching { generation: current, .. } = &*phase {
            if *current == generation {
                *phase = FetchPhase::Idle;
            }
        }
    }
}

/// Convenience for binaries: load config and build the production stack.
pub fn bootstrap(config_path: Option<&Path>) -> Result<(AppConfig, NearbyFlightsOrchestrator)> {
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;
    let orchestrator = NearbyFlightsOrchestrator::from_config(&config)?;
    Ok((config, orchestrator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use fetcher::{ChannelError, CircuitStatus};
    use flight_data::MemoryStore;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Answers per origin after a fixed delay; unknown origins are refused.
    struct FakeBookingApi {
        delay: Duration,
        flights: HashMap<String, Vec<CandidateFlight>>,
        calls: AtomicU32,
    }

    impl FakeBookingApi {
        fn new(delay: Duration) -> Self {
            let date = NaiveDate::from_ymd_opt(2026, 11, 14).unwrap();
            let mut flights = HashMap::new();
            flights.insert(
                "LHR".to_string(),
                vec![
                    CandidateFlight::new("1", "LHR", "CDG", 120.0, date),
                    CandidateFlight::new("2", "LHR", "FCO", 140.0, date),
                    CandidateFlight::new("3", "LHR", "DUB", 60.0, date),
                ],
            );
            flights.insert(
                "MAN".to_string(),
                vec![CandidateFlight::new("4", "MAN", "AMS", 80.0, date)],
            );
            Self {
                delay,
                flights,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CandidateChannel for FakeBookingApi {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self, origin: &str) -> std::result::Result<Vec<CandidateFlight>, ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.flights
                .get(origin)
                .cloned()
                .ok_or_else(|| ChannelError::Connection("connection refused".to_string()))
        }
    }

    fn build(api: Arc<FakeBookingApi>) -> NearbyFlightsOrchestrator {
        NearbyFlightsOrchestrator::with_channel(
            &AppConfig::default(),
            api,
            Arc::new(MemoryStore::new()),
        )
        .with_season(Season::Autumn)
    }

    fn london() -> OriginContext {
        OriginContext::new("LHR", "London", "United Kingdom")
    }

    fn manchester() -> OriginContext {
        OriginContext::new("MAN", "Manchester", "United Kingdom")
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_live_results_are_ranked() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_millis(50)));
        let orchestrator = build(api.clone());

        let result = orchestrator.load_nearby(&london()).await.unwrap().unwrap();

        assert!(!result.degraded);
        assert!(result.notice.is_none());
        assert_eq!(result.flights.len(), 3);
        assert_eq!(result.flights[0].destination_code, "DUB");
        assert!(result.flights.iter().all(|f| f.recommendation_score.is_some()));
        assert!(!orchestrator.is_fetching());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_serves_samples_with_notice() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_millis(50)));
        let orchestrator = build(api.clone());
        for _ in 0..3 {
            orchestrator.fetcher.breaker().record_failure();
        }
        assert_eq!(orchestrator.breaker_state().status, CircuitStatus::Open);

        let result = orchestrator.load_nearby(&london()).await.unwrap().unwrap();

        assert!(result.degraded);
        assert_eq!(result.notice.as_deref(), Some(SAMPLE_NOTICE));
        assert_eq!(result.flights.len(), 6);
        assert_eq!(api.calls(), 0);

        let mut cities: Vec<&str> = result.flights.iter().filter_map(|f| f.city.as_deref()).collect();
        cities.sort();
        assert_eq!(
            cities,
            vec!["Amsterdam", "Barcelona", "Paris", "Prague", "Rome", "Vienna"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentrant_fetch_for_same_origin_is_ignored() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_secs(1)));
        let orchestrator = build(api.clone());

        let origin = london();
        let (first, second) = tokio::join!(orchestrator.load_nearby(&origin), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orchestrator.load_nearby(&origin).await
        });

        assert!(first.unwrap().is_some());
        assert!(second.unwrap().is_none());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_origin_change_cancels_previous_fetch() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_secs(1)));
        let orchestrator = build(api.clone());

        let (lon, man) = (london(), manchester());
        let (first, second) = tokio::join!(orchestrator.load_nearby(&lon), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orchestrator.load_nearby(&man).await
        });

        assert!(first.unwrap().is_none());
        let second = second.unwrap().unwrap();
        assert_eq!(second.origin.code, "MAN");
        assert_eq!(second.flights[0].destination_code, "AMS");
        assert_eq!(api.calls(), 2);
        assert!(!orchestrator.is_fetching());
        // Cancellation is not a failure
        assert_eq!(orchestrator.breaker_state().failure_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_fetches_both_run() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_millis(50)));
        let orchestrator = build(api.clone());

        assert!(orchestrator.load_nearby(&london()).await.unwrap().is_some());
        assert!(orchestrator.load_nearby(&london()).await.unwrap().is_some());
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_shapes_next_pass() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_millis(50)));
        let orchestrator = build(api.clone());

        orchestrator.record_feedback("DUB", FeedbackKind::Dislike);
        orchestrator.record_feedback("FCO", FeedbackKind::Like);

        let result = orchestrator.load_nearby(&london()).await.unwrap().unwrap();
        let codes: Vec<&str> = result
            .flights
            .iter()
            .map(|f| f.destination_code.as_str())
            .collect();

        assert_eq!(codes, vec!["FCO", "CDG", "DUB"]);
        assert!(orchestrator.preferences().is_liked("FCO"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_origin_degrades_after_retries() {
        let api = Arc::new(FakeBookingApi::new(Duration::from_millis(50)));
        let orchestrator = build(api.clone());

        let paris = OriginContext::new("CDG", "Paris", "France");
        let result = orchestrator.load_nearby(&paris).await.unwrap().unwrap();

        assert!(result.degraded);
        // Breaker trips on the third consecutive failure
        assert_eq!(api.calls(), 3);
        assert_eq!(orchestrator.breaker_state().status, CircuitStatus::Open);
        // CDG itself is filtered out as a self-route
        assert_eq!(result.flights.len(), 5);
    }
}
