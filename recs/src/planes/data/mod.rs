pub mod read_through;
pub mod single_flight;
pub mod stats;

pub use read_through::{ReadThroughCache, Timeouts};
pub use single_flight::{FlightAborted, SingleFlight};
pub use stats::{CacheStats, StatsSnapshot};
