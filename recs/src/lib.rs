//! Core of the recommendation service: domain types, the ports that storage
//! and prediction adapters implement, and the read-through data plane.

pub mod domain;
pub mod planes;
pub mod ports;

pub use domain::{CacheKey, Lookup, Source};
pub use planes::data::{CacheStats, ReadThroughCache, SingleFlight, StatsSnapshot, Timeouts};
pub use ports::{CacheStore, Predictor};
