use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use outing_catalog::{DiscoveryFilters, DiscoveryResult};
use outing_shared::{EventCategory, GeoPoint};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_miles: Option<f64>,
    pub keyword: Option<String>,
    pub category: Option<EventCategory>,
    pub starts_after: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl DiscoverQuery {
    fn into_filters(self, state: &AppState) -> Result<DiscoveryFilters, AppError> {
        let defaults = state.discovery;

        let origin = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
            (None, None) => defaults.origin,
            _ => {
                return Err(AppError::ValidationError(
                    "lat and lng must be given together".to_string(),
                ))
            }
        };
        if !origin.is_valid() {
            return Err(AppError::ValidationError("Invalid coordinates".to_string()));
        }

        let radius_miles = self.radius_miles.unwrap_or(defaults.radius_miles);
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(AppError::ValidationError(
                "radius_miles must be positive".to_string(),
            ));
        }

        if let (Some(after), Some(before)) = (self.starts_after, self.starts_before) {
            if after > before {
                return Err(AppError::ValidationError(
                    "starts_after must not be later than starts_before".to_string(),
                ));
            }
        }

        Ok(DiscoveryFilters {
            origin,
            radius_miles,
            keyword: self.keyword,
            category: self.category,
            starts_after: self.starts_after,
            starts_before: self.starts_before,
            page_size: self
                .page_size
                .unwrap_or(defaults.page_size)
                .clamp(1, MAX_PAGE_SIZE),
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/events", get(discover_events))
}

/// GET /v1/events
async fn discover_events(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoveryResult>, AppError> {
    let filters = query.into_filters(&state)?;
    let result = state.aggregator.discover(&filters).await;

    if result.is_degraded() {
        tracing::warn!(warnings = result.warnings.len(), "Serving degraded event results");
    }

    Ok(Json(result))
}
