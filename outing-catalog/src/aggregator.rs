use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use outing_shared::CatalogEvent;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::local::LocalCatalog;
use crate::source::{AdapterWarning, DiscoveryFilters, EventSource};

/// Merged discovery output. `warnings` lists providers that failed and were
/// degraded to zero results.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DiscoveryResult {
    pub events: Vec<CatalogEvent>,
    pub warnings: Vec<AdapterWarning>,
}

impl DiscoveryResult {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Structural identity of an event across providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    starts_at: DateTime<Utc>,
    venue: String,
}

impl DedupKey {
    pub fn of(event: &CatalogEvent) -> Self {
        Self {
            title: normalize(&event.title),
            starts_at: event.starts_at,
            venue: normalize(&event.venue),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First occurrence wins; input order is preserved.
pub fn dedupe(events: Vec<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(DedupKey::of(event)))
        .collect()
}

/// Fans out to every network source, adds the local catalog and dedupes.
pub struct EventAggregator {
    sources: Vec<Arc<dyn EventSource>>,
    local: Option<LocalCatalog>,
}

impl EventAggregator {
    pub fn new(sources: Vec<Arc<dyn EventSource>>, local: Option<LocalCatalog>) -> Self {
        Self { sources, local }
    }

    /// Never fails: each source absorbs its own errors.
    pub async fn discover(&self, filters: &DiscoveryFilters) -> DiscoveryResult {
        let outcomes = join_all(self.sources.iter().map(|source| source.fetch_or_empty(filters))).await;

        let mut events = Vec::new();
        let mut warnings = Vec::new();
        for (batch, warning) in outcomes {
            events.extend(batch);
            warnings.extend(warning);
        }

        if let Some(local) = &self.local {
            events.extend(local.search(filters));
        }

        let total = events.len();
        let events = dedupe(events);

        info!(
            merged = total,
            unique = events.len(),
            degraded = warnings.len(),
            "Event discovery complete"
        );

        DiscoveryResult { events, warnings }
    }
}
