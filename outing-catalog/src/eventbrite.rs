use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use outing_shared::{CatalogEvent, EventSourceKind, GeoPoint};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::categories::{classify, eventbrite_category_id, ClassField, EVENTBRITE_RULES};
use crate::source::{geo_or, parse_coordinate, DiscoveryFilters, EventSource, SourceError};

const SEARCH_PATH: &str = "/v3/events/search/";
const KM_PER_MILE: f64 = 1.609344;
const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct EbResponse {
    #[serde(default)]
    pub events: Vec<EbEvent>,
}

#[derive(Debug, Deserialize)]
pub struct EbEvent {
    pub id: String,
    pub name: Option<EbText>,
    pub description: Option<EbText>,
    pub url: Option<String>,
    pub start: Option<EbTime>,
    pub end: Option<EbTime>,
    pub venue: Option<EbVenue>,
    pub category: Option<EbCategory>,
    pub subcategory: Option<EbCategory>,
    pub logo: Option<EbLogo>,
}

#[derive(Debug, Deserialize)]
pub struct EbText {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EbTime {
    pub utc: Option<String>,
    pub local: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EbVenue {
    pub name: Option<String>,
    pub address: Option<EbAddress>,
    pub latitude: Option<serde_json::Value>,
    pub longitude: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct EbAddress {
    pub localized_address_display: Option<String>,
    pub address_1: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EbCategory {
    pub name: Option<String>,
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EbLogo {
    pub url: Option<String>,
}

pub struct EventbriteSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EventbriteSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn query_params(filters: &DiscoveryFilters) -> Vec<(&'static str, String)> {
        let within_km = (filters.radius_miles.max(1.0) * KM_PER_MILE).round() as u32;

        let mut params = vec![
            ("location.latitude", filters.origin.lat.to_string()),
            ("location.longitude", filters.origin.lng.to_string()),
            ("location.within", format!("{}km", within_km)),
            ("expand", "venue,category".to_string()),
            ("page_size", filters.page_size.to_string()),
        ];

        if let Some(keyword) = filters.keyword() {
            params.push(("q", keyword.to_string()));
        }
        if let Some(after) = filters.starts_after {
            params.push(("start_date.range_start", after.format(LOCAL_FORMAT).to_string()));
        }
        if let Some(before) = filters.starts_before {
            params.push(("start_date.range_end", before.format(LOCAL_FORMAT).to_string()));
        }
        if let Some(id) = filters.category.and_then(eventbrite_category_id) {
            params.push(("categories", id.to_string()));
        }

        params
    }
}

#[async_trait]
impl EventSource for EventbriteSource {
    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Eventbrite
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
            .get(format!("{}{}", self.base_url, SEARCH_PATH))
            .bearer_auth(api_key)
            .query(&Self::query_params(filters))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: EbResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(body
            .events
            .into_iter()
            .filter_map(|event| map_event(event, filters.origin))
            .collect())
    }
}

pub fn map_event(event: EbEvent, fallback_geo: GeoPoint) -> Option<CatalogEvent> {
    let Some(starts_at) = event.start.as_ref().and_then(parse_time) else {
        debug!(id = %event.id, "Dropping Eventbrite event without a start time");
        return None;
    };
    let ends_at = event.end.as_ref().and_then(parse_time);

    let title = event
        .name
        .as_ref()
        .and_then(|n| n.text.clone())
        .unwrap_or_default();
    if title.trim().is_empty() {
        debug!(id = %event.id, "Dropping Eventbrite event without a title");
        return None;
    }

    let popularity = calculate_popularity(&event);

    let category_name = event.category.as_ref().and_then(category_label);
    let subcategory_name = event.subcategory.as_ref().and_then(category_label);
    let category = classify(
        EVENTBRITE_RULES,
        &[
            (ClassField::Category, category_name),
            (ClassField::Subcategory, subcategory_name),
        ],
    );

    let venue = event.venue.as_ref();
    let venue_name = venue.and_then(|v| v.name.clone()).unwrap_or_default();
    let address = venue
        .and_then(|v| v.address.as_ref())
        .map(format_address)
        .unwrap_or_default();
    let geo = geo_or(
        venue.and_then(|v| parse_coordinate(v.latitude.as_ref())),
        venue.and_then(|v| parse_coordinate(v.longitude.as_ref())),
        fallback_geo,
    );

    let description = event.description.and_then(|d| d.text);
    let image_url = event.logo.and_then(|l| l.url);

    Some(
        CatalogEvent::new(
            EventSourceKind::Eventbrite,
            &event.id,
            title,
            category,
            starts_at,
            ends_at,
            venue_name,
            address,
            geo,
            popularity,
        )
        .with_description(description)
        .with_url(event.url)
        .with_image(image_url),
    )
}

/// Same completeness heuristic as Ticketmaster, with description standing in
/// for price ranges.
pub fn calculate_popularity(event: &EbEvent) -> f64 {
    let mut score: f64 = 0.5;

    if event.venue.as_ref().and_then(|v| v.name.as_ref()).is_some() {
        score += 0.2;
    }
    if event.logo.as_ref().and_then(|l| l.url.as_ref()).is_some() {
        score += 0.1;
    }
    if event
        .description
        .as_ref()
        .and_then(|d| d.text.as_deref())
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false)
    {
        score += 0.1;
    }
    if event.url.as_deref().map(|u| !u.is_empty()).unwrap_or(false) {
        score += 0.1;
    }

    score.min(1.0)
}

fn category_label(category: &EbCategory) -> Option<&str> {
    category.name.as_deref().or(category.short_name.as_deref())
}

/// Prefers the UTC field; a bare local timestamp is read as UTC.
fn parse_time(time: &EbTime) -> Option<DateTime<Utc>> {
    if let Some(raw) = time.utc.as_deref() {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let local = time.local.as_deref()?;
    NaiveDateTime::parse_from_str(local, LOCAL_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn format_address(address: &EbAddress) -> String {
    if let Some(display) = address
        .localized_address_display
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        return display.to_string();
    }

    [&address.address_1, &address.city, &address.region]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use outing_shared::EventCategory;
    use serde_json::json;

    const ORIGIN: GeoPoint = GeoPoint::new(41.4993, -81.6944);

    #[test]
    fn test_maps_full_event() {
        let event: EbEvent = serde_json::from_value(json!({
            "id": "771",
            "name": {"text": "Ohio City Beer Walk"},
            "description": {"text": "Six breweries, one ticket."},
            "url": "https://www.eventbrite.com/e/771",
            "start": {"utc": "2026-09-12T22:00:00Z", "local": "2026-09-12T18:00:00"},
            "end": {"utc": "2026-09-13T02:00:00Z", "local": "2026-09-12T22:00:00"},
            "venue": {
                "name": "Market Garden Brewery",
                "address": {"localized_address_display": "1947 W 25th St, Cleveland, OH 44113"},
                "latitude": "41.4849",
                "longitude": "-81.7035"
            },
            "category": {"name": "Food & Drink", "short_name": "Food & Drink"},
            "logo": {"url": "https://img.evbuc.com/771.jpg"}
        }))
        .unwrap();

        let mapped = map_event(event, ORIGIN).unwrap();
        assert_eq!(mapped.id, "eb_771");
        assert_eq!(mapped.category, EventCategory::Food);
        assert_eq!(mapped.starts_at, Utc.with_ymd_and_hms(2026, 9, 12, 22, 0, 0).unwrap());
        assert_eq!(mapped.ends_at, Utc.with_ymd_and_hms(2026, 9, 13, 2, 0, 0).unwrap());
        assert_eq!(mapped.address, "1947 W 25th St, Cleveland, OH 44113");
        assert_eq!(mapped.geo, GeoPoint::new(41.4849, -81.7035));
        assert_eq!(mapped.description.as_deref(), Some("Six breweries, one ticket."));
        assert_eq!(mapped.popularity, 1.0);
    }

    #[test]
    fn test_local_time_fallback_and_subcategory() {
        let event: EbEvent = serde_json::from_value(json!({
            "id": "9",
            "name": {"text": "Open Mic"},
            "start": {"local": "2026-10-01T20:30:00"},
            "category": {"name": "Performing & Visual Arts"},
            "subcategory": {"name": "Comedy"}
        }))
        .unwrap();

        let mapped = map_event(event, ORIGIN).unwrap();
        assert_eq!(mapped.starts_at, Utc.with_ymd_and_hms(2026, 10, 1, 20, 30, 0).unwrap());
        assert_eq!(mapped.category, EventCategory::Comedy);
        assert_eq!(mapped.geo, ORIGIN);
        assert_eq!(mapped.popularity, 0.5);
    }

    #[test]
    fn test_untitled_or_undated_events_are_dropped() {
        let untitled: EbEvent = serde_json::from_value(json!({
            "id": "1", "name": {"text": "  "}, "start": {"utc": "2026-10-01T20:30:00Z"}
        }))
        .unwrap();
        assert!(map_event(untitled, ORIGIN).is_none());

        let undated: EbEvent = serde_json::from_value(json!({
            "id": "2", "name": {"text": "Mystery"}, "start": {}
        }))
        .unwrap();
        assert!(map_event(undated, ORIGIN).is_none());

        // Listings missing the fields entirely still parse
        let bare: EbEvent = serde_json::from_value(json!({"id": "3", "name": null})).unwrap();
        assert!(map_event(bare, ORIGIN).is_none());
    }

    #[test]
    fn test_query_params_convert_radius_to_km() {
        let mut filters = DiscoveryFilters::near(ORIGIN);
        filters.radius_miles = 10.0;
        filters.category = Some(EventCategory::Concert);

        let params = EventbriteSource::query_params(&filters);
        let get = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.clone());

        assert_eq!(get("location.within").as_deref(), Some("16km"));
        assert_eq!(get("expand").as_deref(), Some("venue,category"));
        assert_eq!(get("categories").as_deref(), Some("103"));
        assert!(get("q").is_none());
    }
}
