use outing_core::{FareConfig, RideQuote};
use outing_shared::GeoPoint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::directory::{DropOffPoint, VenueDirectory, VenueMatch};
use crate::intent::Intent;

pub const MIN_QUERY_CHARS: usize = 3;
pub const DEFAULT_RADIUS_MILES: f64 = 15.0;
pub const MAX_ALTERNATIVES: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct SmartAddRequest {
    pub query: String,
    pub origin: Option<GeoPoint>,
    pub radius_miles: Option<f64>,
    pub surge: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SmartAddResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<VenueMatch>,
    pub alternatives: Vec<VenueMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<RideQuote>,
    pub drop_offs: Vec<DropOffPoint>,
}

impl SmartAddResult {
    fn rejected(intent: Intent, notes: String) -> Self {
        Self {
            ok: false,
            notes: Some(notes),
            intent,
            primary: None,
            alternatives: Vec::new(),
            quote: None,
            drop_offs: Vec::new(),
        }
    }
}

/// Turns a free-text destination into a concrete place plus a fare quote.
pub struct SmartAddResolver {
    directory: Arc<VenueDirectory>,
    fares: FareConfig,
}

impl SmartAddResolver {
    pub fn new(directory: Arc<VenueDirectory>, fares: FareConfig) -> Self {
        Self { directory, fares }
    }

    pub fn directory(&self) -> &VenueDirectory {
        &self.directory
    }

    pub fn detect_intent(&self, query: &str) -> Intent {
        self.directory.detector().detect(query)
    }

    pub fn resolve(&self, request: &SmartAddRequest) -> SmartAddResult {
        self.smart_add(
            &request.query,
            request.origin,
            request.radius_miles.unwrap_or(DEFAULT_RADIUS_MILES),
            request.surge.unwrap_or(1.0),
        )
    }

    pub fn smart_add(
        &self,
        query: &str,
        origin: Option<GeoPoint>,
        radius_miles: f64,
        surge: f64,
    ) -> SmartAddResult {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return SmartAddResult::rejected(
                Intent::default(),
                "Type at least 3 characters".to_string(),
            );
        }

        let intent = self.detect_intent(query);

        if let Some(team) = intent.team.clone() {
            if let Some(result) = self.team_venue(&team, origin, surge, intent.clone()) {
                return result;
            }
        }

        let origin = origin
            .filter(GeoPoint::is_valid)
            .unwrap_or_else(|| self.directory.default_origin());
        let radius_miles = if radius_miles.is_finite() && radius_miles > 0.0 {
            radius_miles
        } else {
            DEFAULT_RADIUS_MILES
        };

        let candidates: Vec<VenueMatch> = self
            .candidates(query, &intent, origin)
            .into_iter()
            .filter(|m| m.distance_miles.map(|d| d <= radius_miles).unwrap_or(false))
            .collect();

        let mut candidates = candidates.into_iter();
        let Some(primary) = candidates.next() else {
            debug!(query, radius_miles, "Smart add found no places");
            return SmartAddResult::rejected(
                intent,
                format!("No matching places within {} miles of you", radius_miles),
            );
        };
        let alternatives: Vec<VenueMatch> = candidates.take(MAX_ALTERNATIVES).collect();

        info!(
            query,
            primary = %primary.name,
            alternatives = alternatives.len(),
            "Smart add resolved"
        );

        self.accepted(intent, primary, alternatives, surge, None)
    }

    /// Team mentions always resolve to the home venue, whatever else is closer.
    fn team_venue(
        &self,
        team: &str,
        origin: Option<GeoPoint>,
        surge: f64,
        intent: Intent,
    ) -> Option<SmartAddResult> {
        let venue_id = self.directory.detector().team_venue(team)?;
        let primary = self
            .directory
            .venue_match(venue_id, origin.filter(GeoPoint::is_valid))?;

        info!(team, venue = %primary.name, "Smart add matched a team");

        let notes = format!("{} home games are at {}", team, primary.name);
        Some(self.accepted(intent, primary, Vec::new(), surge, Some(notes)))
    }

    /// Name matches for the venue phrase win outright. With a detected kind,
    /// venues named in the query come first and the rest of that kind follow
    /// as fallbacks. Without one, plain name matching on the whole query.
    fn candidates(&self, query: &str, intent: &Intent, origin: GeoPoint) -> Vec<VenueMatch> {
        if let Some(tokens) = intent.venue_tokens.as_deref() {
            let found = self.name_matches(tokens, origin);
            if !found.is_empty() {
                return found;
            }
        }

        let Some(kind) = intent.category else {
            return self.name_matches(query, origin);
        };

        let resolved = self.directory.resolve_aliases(query);
        let mut found = self.directory.venues_named_in(&resolved, Some(origin));
        for venue in self.directory.venues_of_kind(kind, origin) {
            if !found.iter().any(|m| m.id == venue.id) {
                found.push(venue);
            }
        }
        found
    }

    fn name_matches(&self, text: &str, origin: GeoPoint) -> Vec<VenueMatch> {
        let resolved = self.directory.resolve_aliases(text);
        let found = self.directory.find_venue_matches(&resolved, Some(origin));
        if found.is_empty() {
            self.directory.venues_mentioned_in(&resolved, Some(origin))
        } else {
            found
        }
    }

    fn accepted(
        &self,
        intent: Intent,
        primary: VenueMatch,
        alternatives: Vec<VenueMatch>,
        surge: f64,
        notes: Option<String>,
    ) -> SmartAddResult {
        let quote = primary
            .distance_miles
            .map(|d| RideQuote::build(d, surge, primary.is_airport(), &self.fares));
        let drop_offs = self.directory.drop_offs(&primary.id).to_vec();

        SmartAddResult {
            ok: true,
            notes,
            intent,
            primary: Some(primary),
            alternatives,
            quote,
            drop_offs,
        }
    }
}
