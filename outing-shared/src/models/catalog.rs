use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;

/// Span assumed for providers that only publish a start time.
pub const DEFAULT_EVENT_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Sports,
    Concert,
    Theater,
    Comedy,
    Family,
    Arts,
    Food,
    Nightlife,
    Community,
    General,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Sports => "sports",
            EventCategory::Concert => "concert",
            EventCategory::Theater => "theater",
            EventCategory::Comedy => "comedy",
            EventCategory::Family => "family",
            EventCategory::Arts => "arts",
            EventCategory::Food => "food",
            EventCategory::Nightlife => "nightlife",
            EventCategory::Community => "community",
            EventCategory::General => "general",
        }
    }
}

/// Which adapter produced an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceKind {
    Ticketmaster,
    Eventbrite,
    Local,
}

impl EventSourceKind {
    /// Prefix applied to provider ids so they never collide across sources.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EventSourceKind::Ticketmaster => "tm_",
            EventSourceKind::Eventbrite => "eb_",
            EventSourceKind::Local => "cle_",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventSourceKind::Ticketmaster => "ticketmaster",
            EventSourceKind::Eventbrite => "eventbrite",
            EventSourceKind::Local => "local",
        }
    }
}

/// A normalized, source-tagged happening. Built once by an adapter and
/// treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEvent {
    pub id: String,
    pub title: String,
    pub category: EventCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub venue: String,
    pub address: String,
    pub geo: GeoPoint,
    pub popularity: f64,
    pub source: EventSourceKind,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl CatalogEvent {
    /// Builds an event, prefixing the provider id and repairing the time span
    /// so that `starts_at < ends_at` always holds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: EventSourceKind,
        provider_id: &str,
        title: String,
        category: EventCategory,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
        venue: String,
        address: String,
        geo: GeoPoint,
        popularity: f64,
    ) -> Self {
        let ends_at = match ends_at {
            Some(end) if end > starts_at => end,
            _ => starts_at + Duration::hours(DEFAULT_EVENT_HOURS),
        };

        Self {
            id: format!("{}{}", source.id_prefix(), provider_id),
            title,
            category,
            starts_at,
            ends_at,
            venue,
            address,
            geo,
            popularity: popularity.clamp(0.0, 1.0),
            source,
            description: None,
            url: None,
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }
}
