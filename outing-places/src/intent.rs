use serde::{Deserialize, Serialize};

use crate::directory::{find_phrase, TeamAlias, VenueCategory};

/// Keyword family a query can be classified into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Sports,
    Theater,
    Bar,
    Restaurant,
    Concert,
    Park,
}

impl PlaceKind {
    /// Venue categories that satisfy this kind of outing.
    pub fn venue_categories(&self) -> &'static [VenueCategory] {
        match self {
            PlaceKind::Sports => &[VenueCategory::Stadium, VenueCategory::Arena],
            PlaceKind::Theater => &[VenueCategory::Theater, VenueCategory::Cinema],
            PlaceKind::Bar => &[VenueCategory::Bar],
            PlaceKind::Restaurant => &[VenueCategory::Restaurant],
            PlaceKind::Concert => &[VenueCategory::MusicVenue, VenueCategory::Arena],
            PlaceKind::Park => &[VenueCategory::Park],
        }
    }

    pub fn accepts(&self, category: VenueCategory) -> bool {
        self.venue_categories().contains(&category)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    pub category: Option<PlaceKind>,
    /// Phrase after the last standalone "at", e.g. "drinks at the jake" -> "the jake"
    pub venue_tokens: Option<String>,
    /// Canonical team name when a team was mentioned
    pub team: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub kind: PlaceKind,
}

impl IntentRule {
    fn new(name: &str, kind: PlaceKind, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            kind,
        }
    }

    fn matches(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.keywords.iter().any(|k| k == w))
    }
}

/// Generic keyword families, highest priority first. Team mentions are
/// checked before any of these.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(
            "theater",
            PlaceKind::Theater,
            &["movie", "movies", "cinema", "theater", "theatre", "film", "play", "musical"],
        ),
        IntentRule::new(
            "bar",
            PlaceKind::Bar,
            &["bar", "bars", "pub", "drink", "drinks", "beer", "beers", "brewery", "cocktails"],
        ),
        IntentRule::new(
            "restaurant",
            PlaceKind::Restaurant,
            &["restaurant", "food", "dinner", "lunch", "brunch", "eat", "eats"],
        ),
        IntentRule::new(
            "concert",
            PlaceKind::Concert,
            &["concert", "show", "music", "gig", "band", "live"],
        ),
        IntentRule::new("park", PlaceKind::Park, &["park", "picnic", "trail"]),
    ]
}

/// Classifies free text into a single intent. First matching family wins:
/// team > theater > bar > restaurant > concert > park.
#[derive(Debug, Clone)]
pub struct IntentDetector {
    teams: Vec<TeamAlias>,
    rules: Vec<IntentRule>,
}

impl IntentDetector {
    pub fn new(teams: Vec<TeamAlias>, rules: Vec<IntentRule>) -> Self {
        Self { teams, rules }
    }

    pub fn detect(&self, query: &str) -> Intent {
        let lowered = query.to_lowercase();
        let words = tokenize(&lowered);
        let venue_tokens = trailing_venue_phrase(&words);

        if let Some(team) = self.match_team(&lowered) {
            return Intent {
                category: Some(PlaceKind::Sports),
                venue_tokens,
                team: Some(team.team.clone()),
            };
        }

        let category = self
            .rules
            .iter()
            .find(|rule| rule.matches(&words))
            .map(|rule| rule.kind);

        Intent {
            category,
            venue_tokens,
            team: None,
        }
    }

    /// Venue id for a team mentioned in the query.
    pub fn team_venue(&self, team: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.team.eq_ignore_ascii_case(team))
            .map(|t| t.venue_id.as_str())
    }

    /// Keywords are whole-word phrases, so "white sox" works and "cavs" does
    /// not fire inside "cavset".
    fn match_team(&self, lowered: &str) -> Option<&TeamAlias> {
        self.teams.iter().find(|team| {
            team.keywords
                .iter()
                .any(|k| find_phrase(lowered, k.trim()).is_some())
        })
    }
}

fn tokenize(lowered: &str) -> Vec<&str> {
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '&'))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect()
}

fn trailing_venue_phrase(words: &[&str]) -> Option<String> {
    let at = words.iter().rposition(|w| *w == "at")?;
    let phrase = words[at + 1..].join(" ");
    if phrase.is_empty() {
        None
    } else {
        Some(phrase)
    }
}
