use chrono::{DateTime, Duration, DurationRound, Utc};
use outing_core::haversine_distance;
use outing_shared::{CatalogEvent, EventCategory, EventSourceKind, GeoPoint};
use tracing::debug;

use crate::source::DiscoveryFilters;

/// Downtown Cleveland, the center of the offline coverage region.
pub const CLEVELAND: GeoPoint = GeoPoint::new(41.4993, -81.6944);

struct Seed {
    slug: &'static str,
    title: &'static str,
    category: EventCategory,
    venue: &'static str,
    address: &'static str,
    geo: (f64, f64),
    day_offset: i64,
    /// UTC hour of the start time
    hour: u32,
    duration_hours: i64,
    popularity: f64,
    description: &'static str,
}

const SEEDS: &[Seed] = &[
    Seed {
        slug: "guardians-yankees",
        title: "Guardians vs Yankees",
        category: EventCategory::Sports,
        venue: "Progressive Field",
        address: "2401 Ontario St, Cleveland, OH 44115",
        geo: (41.4962, -81.6852),
        day_offset: 1,
        hour: 23,
        duration_hours: 3,
        popularity: 0.95,
        description: "Home series opener under the lights.",
    },
    Seed {
        slug: "cavs-celtics",
        title: "Cavaliers vs Celtics",
        category: EventCategory::Sports,
        venue: "Rocket Mortgage FieldHouse",
        address: "1 Center Ct, Cleveland, OH 44115",
        geo: (41.4965, -81.6882),
        day_offset: 3,
        hour: 23,
        duration_hours: 3,
        popularity: 0.93,
        description: "Eastern Conference rivalry night.",
    },
    Seed {
        slug: "browns-steelers",
        title: "Browns vs Steelers",
        category: EventCategory::Sports,
        venue: "Cleveland Browns Stadium",
        address: "100 Alfred Lerner Way, Cleveland, OH 44114",
        geo: (41.5061, -81.6995),
        day_offset: 6,
        hour: 17,
        duration_hours: 4,
        popularity: 0.98,
        description: "AFC North showdown on the lakefront.",
    },
    Seed {
        slug: "playhouse-square-broadway",
        title: "Broadway Series: Hamilton",
        category: EventCategory::Theater,
        venue: "KeyBank State Theatre",
        address: "1519 Euclid Ave, Cleveland, OH 44115",
        geo: (41.5015, -81.6812),
        day_offset: 2,
        hour: 23,
        duration_hours: 3,
        popularity: 0.9,
        description: "Touring production at Playhouse Square.",
    },
    Seed {
        slug: "hob-indie-showcase",
        title: "Indie Showcase",
        category: EventCategory::Concert,
        venue: "House of Blues Cleveland",
        address: "308 Euclid Ave, Cleveland, OH 44114",
        geo: (41.4996, -81.6905),
        day_offset: 4,
        hour: 0,
        duration_hours: 3,
        popularity: 0.75,
        description: "Four local bands, one stage.",
    },
    Seed {
        slug: "bop-stop-jazz",
        title: "Friday Night Jazz",
        category: EventCategory::Concert,
        venue: "The Bop Stop",
        address: "2920 Detroit Ave, Cleveland, OH 44113",
        geo: (41.4869, -81.7089),
        day_offset: 5,
        hour: 0,
        duration_hours: 2,
        popularity: 0.6,
        description: "Live jazz trio in Hingetown.",
    },
    Seed {
        slug: "west-side-market-tour",
        title: "West Side Market Food Tour",
        category: EventCategory::Food,
        venue: "West Side Market",
        address: "1979 W 25th St, Cleveland, OH 44113",
        geo: (41.4847, -81.7029),
        day_offset: 2,
        hour: 15,
        duration_hours: 2,
        popularity: 0.7,
        description: "Guided tasting through the market stalls.",
    },
    Seed {
        slug: "improv-late-show",
        title: "Late Show Stand-Up",
        category: EventCategory::Comedy,
        venue: "Cleveland Improv",
        address: "2000 Sycamore St, Cleveland, OH 44113",
        geo: (41.4887, -81.7045),
        day_offset: 3,
        hour: 2,
        duration_hours: 2,
        popularity: 0.65,
        description: "Headliner plus two openers.",
    },
    Seed {
        slug: "cma-minds-wide-open",
        title: "Museum Late Night",
        category: EventCategory::Arts,
        venue: "Cleveland Museum of Art",
        address: "11150 East Blvd, Cleveland, OH 44106",
        geo: (41.5079, -81.6120),
        day_offset: 7,
        hour: 22,
        duration_hours: 3,
        popularity: 0.7,
        description: "Galleries open late with a DJ in the atrium.",
    },
    Seed {
        slug: "science-center-family-day",
        title: "Family Science Day",
        category: EventCategory::Family,
        venue: "Great Lakes Science Center",
        address: "601 Erieside Ave, Cleveland, OH 44114",
        geo: (41.5074, -81.6966),
        day_offset: 8,
        hour: 14,
        duration_hours: 5,
        popularity: 0.55,
        description: "Hands-on demos for all ages.",
    },
    Seed {
        slug: "edgewater-live",
        title: "Edgewater Live",
        category: EventCategory::Concert,
        venue: "Edgewater Park",
        address: "6500 Cleveland Memorial Shoreway, Cleveland, OH 44102",
        geo: (41.4903, -81.7370),
        day_offset: 9,
        hour: 22,
        duration_hours: 3,
        popularity: 0.8,
        description: "Free lakeside concert with food trucks.",
    },
];

/// Curated offline events for the Cleveland region.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    reference: GeoPoint,
    events: Vec<CatalogEvent>,
}

impl LocalCatalog {
    pub fn new(reference: GeoPoint, events: Vec<CatalogEvent>) -> Self {
        Self { reference, events }
    }

    /// Seeds the Cleveland list with start times relative to `anchor`'s day.
    pub fn cleveland(anchor: DateTime<Utc>) -> Self {
        let day = anchor
            .duration_trunc(Duration::days(1))
            .unwrap_or(anchor);

        let events = SEEDS
            .iter()
            .map(|seed| {
                let starts_at = day + Duration::days(seed.day_offset) + Duration::hours(seed.hour as i64);
                CatalogEvent::new(
                    EventSourceKind::Local,
                    seed.slug,
                    seed.title.to_string(),
                    seed.category,
                    starts_at,
                    Some(starts_at + Duration::hours(seed.duration_hours)),
                    seed.venue.to_string(),
                    seed.address.to_string(),
                    GeoPoint::new(seed.geo.0, seed.geo.1),
                    seed.popularity,
                )
                .with_description(Some(seed.description.to_string()))
            })
            .collect();

        Self::new(CLEVELAND, events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the caller's origin lies inside the covered region.
    pub fn covers(&self, origin: GeoPoint, radius_miles: f64) -> bool {
        haversine_distance(origin, self.reference) <= radius_miles
    }

    pub fn search(&self, filters: &DiscoveryFilters) -> Vec<CatalogEvent> {
        if !self.covers(filters.origin, filters.radius_miles) {
            debug!(
                lat = filters.origin.lat,
                lng = filters.origin.lng,
                "Origin outside local catalog coverage"
            );
            return Vec::new();
        }

        let keyword = filters.keyword().map(str::to_lowercase);

        self.events
            .iter()
            .filter(|e| filters.category.map(|c| e.category == c).unwrap_or(true))
            .filter(|e| match keyword.as_deref() {
                Some(k) => matches_keyword(e, k),
                None => true,
            })
            .filter(|e| filters.starts_after.map(|t| e.starts_at >= t).unwrap_or(true))
            .filter(|e| filters.starts_before.map(|t| e.starts_at <= t).unwrap_or(true))
            .cloned()
            .collect()
    }
}

fn matches_keyword(event: &CatalogEvent, keyword: &str) -> bool {
    event.title.to_lowercase().contains(keyword)
        || event.venue.to_lowercase().contains(keyword)
        || event
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(keyword))
            .unwrap_or(false)
}
