//! Hygiene filters applied before scoring.

pub mod duplicate;
pub mod self_route;

pub use duplicate::DuplicateFlightFilter;
pub use self_route::SelfRouteFilter;
