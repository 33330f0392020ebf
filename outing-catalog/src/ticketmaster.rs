use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use outing_shared::{CatalogEvent, EventSourceKind, GeoPoint};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::categories::{classify, ticketmaster_classification, ClassField, TICKETMASTER_RULES};
use crate::source::{geo_or, parse_coordinate, DiscoveryFilters, EventSource, SourceError};

const EVENTS_PATH: &str = "/discovery/v2/events.json";
const DATE_PARAM_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Ticketmaster publishes local dates without a time for some listings.
const DEFAULT_LOCAL_TIME: (u32, u32) = (19, 0);

// ============================================================================
// Wire types (only the fields we read)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TmResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<TmEmbedded>,
}

#[derive(Debug, Deserialize)]
pub struct TmEmbedded {
    #[serde(default)]
    pub events: Vec<TmEvent>,
}

#[derive(Debug, Deserialize)]
pub struct TmEvent {
    pub id: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub info: Option<String>,
    #[serde(default)]
    pub images: Vec<TmImage>,
    pub dates: Option<TmDates>,
    #[serde(default)]
    pub classifications: Vec<TmClassification>,
    #[serde(default, rename = "priceRanges")]
    pub price_ranges: Vec<TmPriceRange>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<TmEventEmbedded>,
}

#[derive(Debug, Deserialize)]
pub struct TmDates {
    pub start: Option<TmStart>,
}

#[derive(Debug, Deserialize)]
pub struct TmStart {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    #[serde(rename = "localDate")]
    pub local_date: Option<String>,
    #[serde(rename = "localTime")]
    pub local_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmNamed {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmClassification {
    pub segment: Option<TmNamed>,
    pub genre: Option<TmNamed>,
}

#[derive(Debug, Deserialize)]
pub struct TmImage {
    pub url: Option<String>,
    pub width: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TmPriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TmEventEmbedded {
    #[serde(default)]
    pub venues: Vec<TmVenue>,
}

#[derive(Debug, Deserialize)]
pub struct TmVenue {
    pub name: Option<String>,
    pub address: Option<TmAddress>,
    pub city: Option<TmNamed>,
    pub state: Option<TmState>,
    pub location: Option<TmLocation>,
}

#[derive(Debug, Deserialize)]
pub struct TmAddress {
    pub line1: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmState {
    #[serde(rename = "stateCode")]
    pub state_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmLocation {
    pub latitude: Option<serde_json::Value>,
    pub longitude: Option<serde_json::Value>,
}

// ============================================================================
// Adapter
// ============================================================================

pub struct TicketmasterSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TicketmasterSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Query string for the discovery endpoint.
    pub fn query_params(&self, api_key: &str, filters: &DiscoveryFilters) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apikey", api_key.to_string()),
            ("latlong", format!("{},{}", filters.origin.lat, filters.origin.lng)),
            ("radius", format!("{}", filters.radius_miles.max(1.0).round() as u32)),
            ("unit", "miles".to_string()),
            ("size", filters.page_size.to_string()),
            ("sort", "date,asc".to_string()),
        ];

        if let Some(keyword) = filters.keyword() {
            params.push(("keyword", keyword.to_string()));
        }
        if let Some(after) = filters.starts_after {
            params.push(("startDateTime", after.format(DATE_PARAM_FORMAT).to_string()));
        }
        if let Some(before) = filters.starts_before {
            params.push(("endDateTime", before.format(DATE_PARAM_FORMAT).to_string()));
        }
        if let Some(classification) = filters.category.and_then(ticketmaster_classification) {
            params.push(("classificationName", classification.to_string()));
        }

        params
    }
}

#[async_trait]
impl EventSource for TicketmasterSource {
    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Ticketmaster
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, filters: &DiscoveryFilters) -> Result<Vec<CatalogEvent>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{}{}", self.base_url, EVENTS_PATH))
            .query(&self.query_params(api_key, filters))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: TmResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let events = body.embedded.map(|e| e.events).unwrap_or_default();
        Ok(events
            .into_iter()
            .filter_map(|event| map_event(event, filters.origin))
            .collect())
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// Translates one provider event. Returns `None` without a title or a usable start time.
pub fn map_event(event: TmEvent, fallback_geo: GeoPoint) -> Option<CatalogEvent> {
    let Some(starts_at) = event.dates.as_ref().and_then(|d| d.start.as_ref()).and_then(parse_start) else {
        debug!(id = %event.id, "Dropping Ticketmaster event without a start time");
        return None;
    };

    let Some(title) = event.name.clone().filter(|n| !n.trim().is_empty()) else {
        debug!(id = %event.id, "Dropping Ticketmaster event without a title");
        return None;
    };

    let popularity = calculate_popularity(&event);

    let classification = event.classifications.first();
    let segment = classification.and_then(|c| c.segment.as_ref()).and_then(|s| s.name.as_deref());
    let genre = classification.and_then(|c| c.genre.as_ref()).and_then(|g| g.name.as_deref());
    let category = classify(
        TICKETMASTER_RULES,
        &[(ClassField::Segment, segment), (ClassField::Genre, genre)],
    );

    let venue = event.embedded.as_ref().and_then(|e| e.venues.first());
    let venue_name = venue.and_then(|v| v.name.clone()).unwrap_or_default();
    let address = venue.map(format_address).unwrap_or_default();
    let location = venue.and_then(|v| v.location.as_ref());
    let geo = geo_or(
        location.and_then(|l| parse_coordinate(l.latitude.as_ref())),
        location.and_then(|l| parse_coordinate(l.longitude.as_ref())),
        fallback_geo,
    );

    let image_url = event
        .images
        .iter()
        .filter(|i| i.url.is_some())
        .max_by_key(|i| i.width.unwrap_or(0))
        .and_then(|i| i.url.clone());

    Some(
        CatalogEvent::new(
            EventSourceKind::Ticketmaster,
            &event.id,
            title,
            category,
            starts_at,
            None,
            venue_name,
            address,
            geo,
            popularity,
        )
        .with_description(event.info)
        .with_url(event.url)
        .with_image(image_url),
    )
}

/// 0.5 baseline plus fixed increments for listing completeness, capped at 1.0.
pub fn calculate_popularity(event: &TmEvent) -> f64 {
    let mut score: f64 = 0.5;

    let has_venue = event
        .embedded
        .as_ref()
        .map(|e| !e.venues.is_empty())
        .unwrap_or(false);
    if has_venue {
        score += 0.2;
    }
    if event.images.iter().any(|i| i.url.is_some()) {
        score += 0.1;
    }
    if event.price_ranges.iter().any(|p| p.min.is_some() || p.max.is_some()) {
        score += 0.1;
    }
    if event.url.as_deref().map(|u| !u.is_empty()).unwrap_or(false) {
        score += 0.1;
    }

    score.min(1.0)
}

fn parse_start(start: &TmStart) -> Option<DateTime<Utc>> {
    if let Some(raw) = start.date_time.as_deref() {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let date = NaiveDate::parse_from_str(start.local_date.as_deref()?, "%Y-%m-%d").ok()?;
    let time = start
        .local_time
        .as_deref()
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok())
        .or_else(|| NaiveTime::from_hms_opt(DEFAULT_LOCAL_TIME.0, DEFAULT_LOCAL_TIME.1, 0))?;

    Some(date.and_time(time).and_utc())
}

fn format_address(venue: &TmVenue) -> String {
    [
        venue.address.as_ref().and_then(|a| a.line1.clone()),
        venue.city.as_ref().and_then(|c| c.name.clone()),
        venue.state.as_ref().and_then(|s| s.state_code.clone()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}
