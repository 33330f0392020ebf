pub mod aggregator;
pub mod categories;
pub mod eventbrite;
pub mod local;
pub mod source;
pub mod ticketmaster;

pub use aggregator::{DiscoveryResult, EventAggregator};
pub use eventbrite::EventbriteSource;
pub use local::LocalCatalog;
pub use source::{AdapterWarning, DiscoveryFilters, EventSource, SourceError};
pub use ticketmaster::TicketmasterSource;
