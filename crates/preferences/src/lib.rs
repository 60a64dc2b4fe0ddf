//! # Preferences Crate
//!
//! Infers and stores a user's travel preferences from implicit signals
//! (clicks, searches) and explicit feedback (like / dislike).
//!
//! ## Components
//!
//! - **types**: `UserPreferences` and the raw event records it holds
//! - **analysis**: re-derives favorite countries, price range and seasonal
//!   affinity from raw history
//! - **debounce**: cancel-and-reschedule delayed task
//! - **store**: `PreferenceStore`, the only write path into preferences
//!
//! ## Example Usage
//!
//! ```ignore
//! use preferences::{FeedbackKind, PreferenceStore, SearchEvent};
//!
//! let store = PreferenceStore::open(storage, index);
//! store.record_click("CDG");
//! store.record_feedback("FCO", FeedbackKind::Like);
//! store.record_search(SearchEvent::new("LHR", "search").with_price(180.0));
//!
//! let prefs = store.snapshot();
//! ```

pub mod types;
pub mod analysis;
pub mod debounce;
pub mod store;

pub use debounce::Debouncer;
pub use store::{Lifecycle, PreferenceStore, PREFERENCES_KEY};
pub use types::{
    ClickEvent, DerivedPreferences, FeedbackKind, PriceRange, SearchEvent, SeasonalAffinity,
    UserPreferences, HISTORY_LIMIT, MAX_FAVORITE_COUNTRIES,
};
