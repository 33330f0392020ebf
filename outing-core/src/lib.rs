pub mod fare;
pub mod geo;
pub mod repository;

pub use fare::{estimate_fare, round_cents, FareConfig, FareLine, RideQuote};
pub use geo::{haversine_distance, EARTH_RADIUS_MILES};
pub use repository::{KeyValueStore, StoreError};
