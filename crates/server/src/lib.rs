//! Server crate for the nearby-flights panel.
//!
//! This crate contains the application configuration and the orchestrator
//! that wires retrieval, preferences and recommendation together.

pub mod config;
pub mod orchestrator;

pub use config::{AppConfig, ConfigError};
pub use orchestrator::{bootstrap, NearbyFlights, NearbyFlightsOrchestrator, SAMPLE_NOTICE};
