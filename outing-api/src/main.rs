use anyhow::Context;
use outing_api::{app, AppState, DiscoveryDefaults};
use outing_catalog::{EventAggregator, EventSource, EventbriteSource, LocalCatalog, TicketmasterSource};
use outing_core::KeyValueStore;
use outing_places::{seed, SmartAddResolver, VenueDirectory};
use outing_promo::CouponService;
use outing_store::app_config::Config;
use outing_store::{MemoryStore, RedisStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outing_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Outing API on port {}", config.server.port);

    let aggregator = build_aggregator(&config)?;
    let directory = Arc::new(load_directory(&config)?);
    let resolver = SmartAddResolver::new(directory.clone(), config.fares.clone());

    let store = build_store(&config)?;
    let coupons = CouponService::hydrate(store)
        .await
        .context("Failed to hydrate coupons")?;

    let app_state = AppState {
        aggregator: Arc::new(aggregator),
        resolver: Arc::new(resolver),
        coupons: Arc::new(coupons),
        discovery: DiscoveryDefaults {
            origin: directory.default_origin(),
            radius_miles: config.discovery.default_radius_miles,
            page_size: config.discovery.page_size,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_aggregator(config: &Config) -> anyhow::Result<EventAggregator> {
    let providers = &config.providers;
    let timeout = Duration::from_secs(providers.timeout_seconds);

    let ticketmaster = TicketmasterSource::new(
        &providers.ticketmaster.base_url,
        providers.ticketmaster.usable_key().map(str::to_string),
        timeout,
    )?;
    let eventbrite = EventbriteSource::new(
        &providers.eventbrite.base_url,
        providers.eventbrite.usable_key().map(str::to_string),
        timeout,
    )?;

    let sources: Vec<Arc<dyn EventSource>> = vec![Arc::new(ticketmaster), Arc::new(eventbrite)];
    for source in &sources {
        if !source.is_configured() {
            tracing::warn!(
                source = source.kind().as_str(),
                "No API key, provider disabled; local catalog still serves"
            );
        }
    }

    Ok(EventAggregator::new(
        sources,
        Some(LocalCatalog::cleveland(chrono::Utc::now())),
    ))
}

fn load_directory(config: &Config) -> anyhow::Result<VenueDirectory> {
    match config.directory.path.as_deref() {
        Some(path) => VenueDirectory::from_json_file(path)
            .with_context(|| format!("Failed to load venue directory from {}", path)),
        None => Ok(seed::cleveland()),
    }
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match &config.redis {
        Some(redis) => {
            tracing::info!(namespace = %redis.namespace, "Using Redis coupon store");
            let store = RedisStore::new(&redis.url, &redis.namespace).context("Invalid Redis URL")?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No Redis configured, coupon state lives in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
