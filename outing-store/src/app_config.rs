use config::builder::DefaultState;
use config::ConfigBuilder;
use outing_core::FareConfig;
use outing_shared::Masked;
use serde::Deserialize;
use std::env;

pub const TICKETMASTER_KEY_VAR: &str = "EXPO_PUBLIC_TICKETMASTER_API_KEY";
pub const EVENTBRITE_KEY_VAR: &str = "EXPO_PUBLIC_EVENTBRITE_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: Option<RedisConfig>,
    pub providers: ProvidersConfig,
    pub fares: FareConfig,
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "outing".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub timeout_seconds: u64,
    pub ticketmaster: ProviderConfig,
    pub eventbrite: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<Masked<String>>,
}

impl ProviderConfig {
    /// Key that is present and non-blank.
    pub fn usable_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .filter(|k| !k.is_blank())
            .map(|k| k.expose().as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    pub default_radius_miles: f64,
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DirectoryConfig {
    /// JSON file with venues and alias tables; the built-in seed is used when unset
    pub path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `OUTING__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("OUTING").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        Ok(config.with_expo_keys(|name| env::var(name).ok()))
    }

    /// Built-in defaults every other source layers on top of.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        let fares = FareConfig::default();

        config::Config::builder()
            .set_default("server.port", 8080)?
            .set_default("providers.timeout_seconds", 10)?
            .set_default("providers.ticketmaster.base_url", "https://app.ticketmaster.com")?
            .set_default("providers.eventbrite.base_url", "https://www.eventbriteapi.com")?
            .set_default("fares.base", fares.base)?
            .set_default("fares.per_mile", fares.per_mile)?
            .set_default("fares.airport_fee", fares.airport_fee)?
            .set_default("discovery.default_radius_miles", 25.0)?
            .set_default("discovery.page_size", 50)
    }

    /// The mobile app ships provider keys as `EXPO_PUBLIC_*` variables; they win
    /// over file configuration when set.
    pub fn with_expo_keys<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(TICKETMASTER_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.providers.ticketmaster.api_key = Some(Masked(key));
        }
        if let Some(key) = lookup(EVENTBRITE_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.providers.eventbrite.api_key = Some(Masked(key));
        }
        self
    }
}
