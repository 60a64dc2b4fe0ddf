//! Scoring and diversity-enforced selection of candidate flights.
//!
//! This crate provides:
//! - Filter trait and hygiene filters for raw candidate sets
//! - FilterPipeline for composing filters
//! - Additive preference scoring with a per-term breakdown
//! - Diversity-enforced top-N selection
//! - RecommendationEngine, which runs the whole pass
//!
//! ## Architecture
//! Candidates flow through the engine in stages:
//! 1. Enrichment fills in country and city from the destination table
//! 2. Filters drop self-routes and duplicate listings
//! 3. Scoring annotates each candidate with `recommendation_score`
//! 4. Selection keeps at most six, one per country where possible
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::RecommendationEngine;
//!
//! let engine = RecommendationEngine::new(index.clone());
//! let ranked = engine.recommend(candidates, &store.snapshot(), Season::current())?;
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod scoring;
pub mod diversity;
pub mod engine;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use scoring::{ScoreBreakdown, ScoredFlight};
pub use diversity::{select_diverse, DEFAULT_LIMIT};
pub use engine::RecommendationEngine;
