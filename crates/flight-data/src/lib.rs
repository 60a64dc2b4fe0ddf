//! # Flight Data Crate
//!
//! Shared building blocks for the nearby-flights recommender.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (CandidateFlight, OriginContext, Season)
//! - **parser**: Decode raw candidate records from the booking API
//! - **index**: Static destination reference table and enrichment
//! - **storage**: Versioned key-value persistence (JSON file / memory)
//! - **error**: Error types for decoding and storage
//!
//! ## Example Usage
//!
//! ```ignore
//! use flight_data::{parser, DestinationIndex};
//!
//! let mut candidates = parser::parse_candidates(&body, "LHR")?;
//! let index = DestinationIndex::builtin();
//! index.enrich(&mut candidates);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod storage;

// Re-export commonly used types for convenience
pub use error::{DataError, Result, StorageError, StorageResult};
pub use index::{Destination, DestinationIndex};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{AirportCode, CandidateFlight, FlightId, OriginContext, Season};
