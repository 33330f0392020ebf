pub mod models;
pub mod pii;

pub use models::catalog::{CatalogEvent, EventCategory, EventSourceKind};
pub use models::geo::GeoPoint;
pub use pii::Masked;
