//! Durable, debounced preference store.
//!
//! The store is the only write path into `UserPreferences`. Raw mutations
//! are persisted immediately; derived fields are recomputed by a debounced
//! `reanalyze` pass that only writes when the derived output changed.
//!
//! Storage failures are logged and swallowed: preferences improve ranking
//! but are never required for correctness.

use crate::analysis;
use crate::debounce::Debouncer;
use crate::types::{FeedbackKind, SearchEvent, UserPreferences};
use chrono::Utc;
use flight_data::storage::{load_record, save_record};
use flight_data::{DestinationIndex, KeyValueStore};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Storage key for the preference record
pub const PREFERENCES_KEY: &str = "user_preferences";

/// Quiet period before derived fields are recomputed
pub const DEFAULT_REANALYZE_DELAY: Duration = Duration::from_millis(300);

/// Whether the store may still commit work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Mounted,
    Unmounted,
}

#[derive(Debug)]
struct State {
    prefs: UserPreferences,
    lifecycle: Lifecycle,
}

struct Shared {
    state: Mutex<State>,
    storage: Arc<dyn KeyValueStore>,
    index: Arc<DestinationIndex>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn persist(&self, prefs: &UserPreferences) {
        if let Err(e) = save_record(self.storage.as_ref(), PREFERENCES_KEY, prefs) {
            warn!("Failed to persist preferences, keeping in-memory copy: {}", e);
        }
    }

    /// Recompute derived fields; write only when they changed.
    fn reanalyze(&self) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if state.lifecycle == Lifecycle::Unmounted {
                debug!("Preference store unmounted, skipping reanalysis");
                return false;
            }

            let derived = analysis::derive(&state.prefs, &self.index);
            if derived == state.prefs.derived() {
                return false;
            }
            state.prefs.set_derived(derived);
            state.prefs.clone()
        };

        debug!(
            "Derived preferences updated: favorites={:?}, price_range={:?}",
            snapshot.favorite_countries, snapshot.price_range
        );
        self.persist(&snapshot);
        true
    }
}

/// Owner of the user's `UserPreferences`.
pub struct PreferenceStore {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl PreferenceStore {
    /// Open the store, loading any previously persisted preferences.
    ///
    /// A missing, unreadable or incompatible record starts from defaults.
    pub fn open(storage: Arc<dyn KeyValueStore>, index: Arc<DestinationIndex>) -> Self {
        let prefs = match load_record::<UserPreferences>(storage.as_ref(), PREFERENCES_KEY) {
            Ok(Some(prefs)) => {
                info!(
                    "Loaded preferences: {} searches, {} clicks",
                    prefs.search_history.len(),
                    prefs.clicked_destinations.len()
                );
                prefs
            }
            Ok(None) => UserPreferences::default(),
            Err(e) => {
                warn!("Ignoring stored preferences: {}", e);
                UserPreferences::default()
            }
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    prefs,
                    lifecycle: Lifecycle::Mounted,
                }),
                storage,
                index,
            }),
            debouncer: Debouncer::new(DEFAULT_REANALYZE_DELAY),
        }
    }

    /// Configure the reanalysis quiet period (default: 300ms)
    pub fn with_reanalyze_delay(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    #[instrument(skip(self, event), fields(origin = %event.origin_code))]
    pub fn record_search(&self, event: SearchEvent) {
        let changed = self.mutate(|prefs| {
            prefs.push_search(event);
            true
        });
        if changed {
            self.schedule_reanalysis();
        }
    }

    #[instrument(skip(self))]
    pub fn record_click(&self, destination_code: &str) {
        let changed = self.mutate(|prefs| {
            prefs.push_click(destination_code, Utc::now());
            true
        });
        if changed {
            self.schedule_reanalysis();
        }
    }

    /// Record like/dislike feedback. Derived fields do not depend on
    /// feedback, so no reanalysis is scheduled.
    #[instrument(skip(self))]
    pub fn record_feedback(&self, destination_code: &str, kind: FeedbackKind) {
        self.mutate(|prefs| prefs.apply_feedback(destination_code, kind));
    }

    /// Immutable copy of the current preferences.
    pub fn snapshot(&self) -> UserPreferences {
        self.shared.lock().prefs.clone()
    }

    /// Recompute derived fields now.
    ///
    /// Returns `true` if the derived fields changed (and were persisted).
    pub fn reanalyze(&self) -> bool {
        self.shared.reanalyze()
    }

    /// Cancel a pending debounced pass and run it immediately.
    pub fn flush(&self) -> bool {
        self.debouncer.cancel();
        self.reanalyze()
    }

    pub fn is_reanalysis_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Wipe all preferences, in memory and in storage.
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.shared.lock().prefs = UserPreferences::default();
        if let Err(e) = self.shared.storage.remove(PREFERENCES_KEY) {
            warn!("Failed to remove stored preferences: {}", e);
        }
        info!("Preferences cleared");
    }

    /// Tear down: no further debounced work will be committed.
    pub fn shutdown(&self) {
        self.shared.lock().lifecycle = Lifecycle::Unmounted;
        self.debouncer.cancel();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lock().lifecycle
    }

    fn mutate(&self, apply: impl FnOnce(&mut UserPreferences) -> bool) -> bool {
        let snapshot = {
            let mut state = self.shared.lock();
            if state.lifecycle == Lifecycle::Unmounted {
                warn!("Ignoring preference update after shutdown");
                return false;
            }
            if !apply(&mut state.prefs) {
                return false;
            }
            state.prefs.last_updated = Some(Utc::now());
            state.prefs.clone()
        };
        self.shared.persist(&snapshot);
        true
    }

    fn schedule_reanalysis(&self) {
        let shared = Arc::clone(&self.shared);
        let scheduled = self.debouncer.schedule(move || {
            shared.reanalyze();
        });
        if !scheduled {
            // No runtime to defer onto; keep the caches fresh synchronously.
            self.shared.reanalyze();
        }
    }
}

impl Drop for PreferenceStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
