pub mod directory;
pub mod intent;
pub mod resolver;
pub mod seed;

pub use directory::{
    DirectoryData, DirectoryError, DropOffPoint, TeamAlias, Venue, VenueAlias, VenueCategory,
    VenueDirectory, VenueMatch,
};
pub use intent::{Intent, IntentDetector, IntentRule, PlaceKind};
pub use resolver::{SmartAddRequest, SmartAddResolver, SmartAddResult};
