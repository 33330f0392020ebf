use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outing_shared::{CatalogEvent, EventCategory, EventSourceKind, GeoPoint};
use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_RADIUS_MILES: f64 = 25.0;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// What the caller is looking for
#[derive(Debug, Clone)]
pub struct DiscoveryFilters {
    pub origin: GeoPoint,
    pub radius_miles: f64,
    pub keyword: Option<String>,
    pub category: Option<EventCategory>,
    pub starts_after: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
    pub page_size: u32,
}

impl DiscoveryFilters {
    pub fn near(origin: GeoPoint) -> Self {
        Self {
            origin,
            radius_miles: DEFAULT_RADIUS_MILES,
            keyword: None,
            category: None,
            starts_after: None,
            starts_before: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Trimmed, non-empty keyword.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// Degraded-mode notice: a provider failed and contributed nothing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdapterWarning {
    pub source: EventSourceKind,
    pub reason: String,
}

/// A provider-specific translation layer into [`CatalogEvent`].
#[async_trait]
pub trait EventSource: Send + Sync {
    fn kind(&self) -> EventSourceKind;

    /// Whether credentials are present. Unconfigured sources produce zero
    /// results without touching the network.
    fn is_configured(&self) -> bool;

    async fn fetch(&self, filters: &DiscoveryFilters) -> Result<Vec<CatalogEvent>, SourceError>;

    /// Adapter boundary: failures are logged and become an empty list plus a warning.
    async fn fetch_or_empty(
        &self,
        filters: &DiscoveryFilters,
    ) -> (Vec<CatalogEvent>, Option<AdapterWarning>) {
        if !self.is_configured() {
            debug!(source = self.kind().as_str(), "Source not configured, skipping");
            return (Vec::new(), None);
        }

        match self.fetch(filters).await {
            Ok(events) => {
                debug!(source = self.kind().as_str(), count = events.len(), "Source fetch complete");
                (events, None)
            }
            Err(e) => {
                warn!(source = self.kind().as_str(), error = %e, "Source fetch failed, degrading to empty");
                let warning = AdapterWarning {
                    source: self.kind(),
                    reason: e.to_string(),
                };
                (Vec::new(), Some(warning))
            }
        }
    }
}

/// Parses a coordinate that providers send either as a string or a number.
pub(crate) fn parse_coordinate(raw: Option<&serde_json::Value>) -> Option<f64> {
    match raw? {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Provider geo when both coordinates parse, else the caller's origin.
pub(crate) fn geo_or(lat: Option<f64>, lng: Option<f64>, fallback: GeoPoint) -> GeoPoint {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if point.is_valid() {
                point
            } else {
                fallback
            }
        }
        _ => fallback,
    }
}
