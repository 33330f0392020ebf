use outing_core::haversine_distance;
use outing_shared::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::intent::{default_rules, IntentDetector, PlaceKind};

/// Maximum number of name matches returned by a lookup.
pub const MAX_MATCHES: usize = 5;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read directory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate venue id: {0}")]
    DuplicateVenue(String),

    #[error("{kind} references unknown venue {venue_id}")]
    UnknownVenue { kind: &'static str, venue_id: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VenueCategory {
    Stadium,
    Arena,
    Theater,
    Cinema,
    Bar,
    Restaurant,
    MusicVenue,
    Park,
    Airport,
    Landmark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub category: VenueCategory,
}

impl Venue {
    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A venue as returned to callers. `distance_miles` is only present when the
/// lookup had an origin and is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueMatch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<VenueCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

impl VenueMatch {
    fn from_venue(venue: &Venue, origin: Option<GeoPoint>) -> Self {
        Self {
            id: venue.id.clone(),
            name: venue.name.clone(),
            address: venue.address.clone(),
            lat: venue.lat,
            lng: venue.lng,
            category: Some(venue.category),
            distance_miles: origin.map(|o| haversine_distance(o, venue.geo())),
        }
    }

    pub fn is_airport(&self) -> bool {
        self.category == Some(VenueCategory::Airport)
    }
}

/// Named gate or curb for venues with several entrances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DropOffPoint {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAlias {
    /// Display name, e.g. "Browns"
    pub team: String,
    /// Lower-case words that mention the team
    pub keywords: Vec<String>,
    pub venue_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueAlias {
    pub alias: String,
    pub venue_id: String,
}

/// Serialized form of the directory. Adding a venue is a data change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryData {
    pub default_origin: GeoPoint,
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub teams: Vec<TeamAlias>,
    #[serde(default)]
    pub aliases: Vec<VenueAlias>,
    #[serde(default)]
    pub drop_offs: HashMap<String, Vec<DropOffPoint>>,
}

/// Read-only lookup table of points of interest.
#[derive(Debug, Clone)]
pub struct VenueDirectory {
    default_origin: GeoPoint,
    venues: Vec<Venue>,
    /// (lower-case alias, canonical lower-case venue name), longest alias first
    aliases: Vec<(String, String)>,
    drop_offs: HashMap<String, Vec<DropOffPoint>>,
    detector: IntentDetector,
}

impl VenueDirectory {
    pub fn from_data(data: DirectoryData) -> Result<Self, DirectoryError> {
        let mut ids = HashSet::new();
        for venue in &data.venues {
            if !ids.insert(venue.id.as_str()) {
                return Err(DirectoryError::DuplicateVenue(venue.id.clone()));
            }
        }

        let name_of = |kind: &'static str, venue_id: &str| {
            data.venues
                .iter()
                .find(|v| v.id == venue_id)
                .map(|v| v.name.to_lowercase())
                .ok_or_else(|| DirectoryError::UnknownVenue {
                    kind,
                    venue_id: venue_id.to_string(),
                })
        };

        for team in &data.teams {
            name_of("team alias", &team.venue_id)?;
        }
        for venue_id in data.drop_offs.keys() {
            name_of("drop-off list", venue_id)?;
        }

        let mut aliases = data
            .aliases
            .iter()
            .map(|a| Ok((a.alias.trim().to_lowercase(), name_of("alias", &a.venue_id)?)))
            .collect::<Result<Vec<_>, DirectoryError>>()?;
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let teams = data
            .teams
            .into_iter()
            .map(|mut t| {
                t.keywords = t.keywords.iter().map(|k| k.to_lowercase()).collect();
                t
            })
            .collect();

        Ok(Self {
            default_origin: data.default_origin,
            venues: data.venues,
            aliases,
            drop_offs: data.drop_offs,
            detector: IntentDetector::new(teams, default_rules()),
        })
    }

    pub fn empty(default_origin: GeoPoint) -> Self {
        Self {
            default_origin,
            venues: Vec::new(),
            aliases: Vec::new(),
            drop_offs: HashMap::new(),
            detector: IntentDetector::new(Vec::new(), default_rules()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        let data: DirectoryData = serde_json::from_str(raw)?;
        Self::from_data(data)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let directory = Self::from_json(&raw)?;
        info!(path = %path.display(), venues = directory.len(), "Loaded venue directory");
        Ok(directory)
    }

    pub fn default_origin(&self) -> GeoPoint {
        self.default_origin
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn detector(&self) -> &IntentDetector {
        &self.detector
    }

    pub fn venue(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }

    pub fn drop_offs(&self, venue_id: &str) -> &[DropOffPoint] {
        self.drop_offs
            .get(venue_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replaces short names with the canonical venue name, e.g. "drinks by the jake"
    /// becomes "drinks by progressive field". Output is lower-case.
    pub fn resolve_aliases(&self, text: &str) -> String {
        let mut resolved = text.trim().to_lowercase();
        for (alias, canonical) in &self.aliases {
            if let Some(pos) = find_phrase(&resolved, alias) {
                resolved.replace_range(pos..pos + alias.len(), canonical);
            }
        }
        resolved
    }

    /// Case-insensitive substring match on venue names. With an origin every
    /// match carries its distance and the list is stable sorted nearest first.
    pub fn find_venue_matches(&self, query: &str, origin: Option<GeoPoint>) -> Vec<VenueMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let matches = self
            .venues
            .iter()
            .filter(|v| v.name.to_lowercase().contains(&needle))
            .map(|v| VenueMatch::from_venue(v, origin))
            .collect();

        let mut matches = sort_by_distance(matches);
        matches.truncate(MAX_MATCHES);
        matches
    }

    /// Venues whose full name appears inside free text, e.g. "ride to barley house tonight".
    pub fn venues_mentioned_in(&self, text: &str, origin: Option<GeoPoint>) -> Vec<VenueMatch> {
        let haystack = text.to_lowercase();
        let matches = self
            .venues
            .iter()
            .filter(|v| haystack.contains(&v.name.to_lowercase()))
            .map(|v| VenueMatch::from_venue(v, origin))
            .collect();
        sort_by_distance(matches)
    }

    /// Venues whose name contains `text` as whole words, or whose full name
    /// appears as whole words inside `text`. "agora theatre" and "wade oval park"
    /// both hit, "bar" does not hit "Barley House".
    pub fn venues_named_in(&self, text: &str, origin: Option<GeoPoint>) -> Vec<VenueMatch> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return Vec::new();
        }

        let matches = self
            .venues
            .iter()
            .filter(|v| {
                let name = v.name.to_lowercase();
                find_phrase(&name, &text).is_some() || find_phrase(&text, &name).is_some()
            })
            .map(|v| VenueMatch::from_venue(v, origin))
            .collect();
        sort_by_distance(matches)
    }

    /// Every venue of the given kind, nearest first.
    pub fn venues_of_kind(&self, kind: PlaceKind, origin: GeoPoint) -> Vec<VenueMatch> {
        let matches = self
            .venues
            .iter()
            .filter(|v| kind.accepts(v.category))
            .map(|v| VenueMatch::from_venue(v, Some(origin)))
            .collect();
        sort_by_distance(matches)
    }

    pub fn venue_match(&self, id: &str, origin: Option<GeoPoint>) -> Option<VenueMatch> {
        self.venue(id).map(|v| VenueMatch::from_venue(v, origin))
    }
}

/// `sort_by` is stable, so equal distances keep table order.
fn sort_by_distance(mut matches: Vec<VenueMatch>) -> Vec<VenueMatch> {
    matches.sort_by(|a, b| {
        let da = a.distance_miles.unwrap_or(0.0);
        let db = b.distance_miles.unwrap_or(0.0);
        da.total_cmp(&db)
    });
    matches
}

/// Byte offset of `phrase` in `text` when it sits on word boundaries.
pub(crate) fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return None;
    }
    text.match_indices(phrase).map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + phrase.len()..].chars().next();
        !before.map(char::is_alphanumeric).unwrap_or(false)
            && !after.map(char::is_alphanumeric).unwrap_or(false)
    })
}
