//! Built-in Cleveland directory used when no directory file is configured.

use outing_shared::GeoPoint;
use std::collections::HashMap;
use tracing::error;

use crate::directory::{
    DirectoryData, DropOffPoint, TeamAlias, Venue, VenueAlias, VenueCategory, VenueDirectory,
};

/// Public Square, downtown Cleveland.
pub const DOWNTOWN_CLEVELAND: GeoPoint = GeoPoint::new(41.4993, -81.6944);

const VENUES: &[(&str, &str, &str, f64, f64, VenueCategory)] = &[
    ("browns-stadium", "Cleveland Browns Stadium", "100 Alfred Lerner Way, Cleveland, OH 44114", 41.5061, -81.6995, VenueCategory::Stadium),
    ("progressive-field", "Progressive Field", "2401 Ontario St, Cleveland, OH 44115", 41.4962, -81.6852, VenueCategory::Stadium),
    ("rocket-arena", "Rocket Mortgage FieldHouse", "1 Center Ct, Cleveland, OH 44115", 41.4965, -81.6882, VenueCategory::Arena),
    ("playhouse-square", "Playhouse Square", "1501 Euclid Ave, Cleveland, OH 44115", 41.5015, -81.6812, VenueCategory::Theater),
    ("cedar-lee", "Cedar Lee Theatre", "2163 Lee Rd, Cleveland Heights, OH 44118", 41.5016, -81.5786, VenueCategory::Cinema),
    ("capitol-theatre", "Capitol Theatre", "1390 W 65th St, Cleveland, OH 44102", 41.4843, -81.7330, VenueCategory::Cinema),
    ("browns-backers", "Browns Backers Tap Room", "1200 W 6th St, Cleveland, OH 44113", 41.4993, -81.6990, VenueCategory::Bar),
    ("barley-house", "Barley House", "1261 W 6th St, Cleveland, OH 44113", 41.4996, -81.7008, VenueCategory::Bar),
    ("harbor-inn", "Harbor Inn", "1219 Main Ave, Cleveland, OH 44113", 41.4983, -81.7051, VenueCategory::Bar),
    ("lola", "Lola Bistro", "2058 E 4th St, Cleveland, OH 44115", 41.4990, -81.6901, VenueCategory::Restaurant),
    ("mabels", "Mabel's BBQ", "2050 E 4th St, Cleveland, OH 44115", 41.4992, -81.6900, VenueCategory::Restaurant),
    ("slymans", "Slyman's Restaurant", "3106 St Clair Ave NE, Cleveland, OH 44114", 41.5155, -81.6689, VenueCategory::Restaurant),
    ("house-of-blues", "House of Blues Cleveland", "308 Euclid Ave, Cleveland, OH 44114", 41.4996, -81.6905, VenueCategory::MusicVenue),
    ("jacobs-pavilion", "Jacobs Pavilion at Nautica", "2014 Sycamore St, Cleveland, OH 44113", 41.4936, -81.7047, VenueCategory::MusicVenue),
    ("agora", "Agora Theatre", "5000 Euclid Ave, Cleveland, OH 44103", 41.5037, -81.6545, VenueCategory::MusicVenue),
    ("edgewater-park", "Edgewater Park", "6500 Cleveland Memorial Shoreway, Cleveland, OH 44102", 41.4903, -81.7370, VenueCategory::Park),
    ("wade-oval", "Wade Oval", "10820 East Blvd, Cleveland, OH 44106", 41.5087, -81.6110, VenueCategory::Park),
    ("east-4th", "East 4th Street", "E 4th St, Cleveland, OH 44115", 41.4991, -81.6903, VenueCategory::Landmark),
    ("rock-hall", "Rock & Roll Hall of Fame", "1100 E 9th St, Cleveland, OH 44114", 41.5085, -81.6954, VenueCategory::Landmark),
    ("cle-airport", "Cleveland Hopkins International Airport", "5300 Riverside Dr, Cleveland, OH 44135", 41.4117, -81.8498, VenueCategory::Airport),
];

const TEAMS: &[(&str, &[&str], &str)] = &[
    ("Browns", &["browns", "dawg", "dawgs"], "browns-stadium"),
    ("Guardians", &["guardians", "guards", "indians", "tribe"], "progressive-field"),
    ("Cavaliers", &["cavaliers", "cavs"], "rocket-arena"),
    ("Monsters", &["monsters"], "rocket-arena"),
];

const ALIASES: &[(&str, &str)] = &[
    ("the jake", "progressive-field"),
    ("jacobs field", "progressive-field"),
    ("the q", "rocket-arena"),
    ("quicken loans arena", "rocket-arena"),
    ("the fieldhouse", "rocket-arena"),
    ("firstenergy stadium", "browns-stadium"),
    ("first energy", "browns-stadium"),
    ("huntington bank field", "browns-stadium"),
    ("the state theatre", "playhouse-square"),
    ("nautica", "jacobs-pavilion"),
    ("e 4th", "east-4th"),
    ("e. 4th", "east-4th"),
    ("hopkins", "cle-airport"),
    ("cle", "cle-airport"),
    ("rock hall", "rock-hall"),
];

const DROP_OFFS: &[(&str, &str, f64, f64, Option<&str>)] = &[
    ("browns-stadium", "Gate A (West 3rd St)", 41.5049, -81.7005, Some("Closest to the Muni Lot")),
    ("browns-stadium", "Gate D (Alfred Lerner Way)", 41.5072, -81.6982, None),
    ("browns-stadium", "Great Lakes Science Center curb", 41.5074, -81.6966, Some("Use after the game, less traffic")),
    ("progressive-field", "Gate C (Carnegie Ave)", 41.4953, -81.6860, None),
    ("progressive-field", "Right Field Gate (Eagle Ave)", 41.4975, -81.6843, Some("Team shop entrance")),
    ("rocket-arena", "Huron Rd entrance", 41.4975, -81.6889, None),
    ("rocket-arena", "Gateway Plaza", 41.4959, -81.6870, Some("Shared with Progressive Field on game nights")),
    ("cle-airport", "Departures level", 41.4111, -81.8496, None),
];

/// The built-in directory as serializable data.
pub fn cleveland_data() -> DirectoryData {
    let venues = VENUES
        .iter()
        .map(|&(id, name, address, lat, lng, category)| Venue {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            lat,
            lng,
            category,
        })
        .collect();

    let teams = TEAMS
        .iter()
        .map(|&(team, keywords, venue_id)| TeamAlias {
            team: team.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            venue_id: venue_id.to_string(),
        })
        .collect();

    let aliases = ALIASES
        .iter()
        .map(|&(alias, venue_id)| VenueAlias {
            alias: alias.to_string(),
            venue_id: venue_id.to_string(),
        })
        .collect();

    let mut drop_offs: HashMap<String, Vec<DropOffPoint>> = HashMap::new();
    for &(venue_id, label, lat, lng, note) in DROP_OFFS {
        drop_offs
            .entry(venue_id.to_string())
            .or_default()
            .push(DropOffPoint {
                label: label.to_string(),
                lat,
                lng,
                note: note.map(str::to_string),
            });
    }

    DirectoryData {
        default_origin: DOWNTOWN_CLEVELAND,
        venues,
        teams,
        aliases,
        drop_offs,
    }
}

/// Directory built from the seed tables. An inconsistent seed is logged and
/// degrades to an empty directory instead of panicking.
pub fn cleveland() -> VenueDirectory {
    VenueDirectory::from_data(cleveland_data()).unwrap_or_else(|e| {
        error!(error = %e, "Built-in venue directory is inconsistent");
        VenueDirectory::empty(DOWNTOWN_CLEVELAND)
    })
}
