use serde::Deserialize;

use crate::infrastructure::cache::CacheStoresConfig;
use crate::infrastructure::client::{ClientCacheConfig, PersonalAccessClient, PostgresConfig};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    /// Cache stores by name
    pub cache: CacheStoresConfig,
    pub client_cache: ClientCacheConfig,
    pub personal_access_client: Option<PersonalAccessClient>,
    /// Client storage; clients are kept in memory when absent
    pub database: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Layers `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("client_cache.tags")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
