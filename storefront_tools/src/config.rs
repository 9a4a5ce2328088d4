use std::{env, time::Duration};

use log::*;
use storefront_common::helpers::{parse_boolean_flag, parse_millis, parse_number};
use storefront_engine::{PoolSettings, RetryPolicy};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_ORDER_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

#[derive(Clone, Debug)]
pub struct StorefrontConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a writer waits for the database lock before giving up.
    pub busy_timeout: Duration,
    /// Extra attempts for an order that lost a lock race.
    pub order_retries: u32,
    /// Create the database file if it does not exist.
    pub create_db: bool,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            order_retries: DEFAULT_ORDER_RETRIES,
            create_db: true,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("STOREFRONT_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ STOREFRONT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_number(env::var("STOREFRONT_MAX_CONNECTIONS").ok(), DEFAULT_MAX_CONNECTIONS);
        let max_connections = if max_connections == 0 {
            error!("🪛️ STOREFRONT_MAX_CONNECTIONS must be at least 1. Using {DEFAULT_MAX_CONNECTIONS} instead.");
            DEFAULT_MAX_CONNECTIONS
        } else {
            max_connections
        };
        let busy_timeout = parse_millis(env::var("STOREFRONT_BUSY_TIMEOUT_MS").ok(), DEFAULT_BUSY_TIMEOUT);
        let order_retries = parse_number(env::var("STOREFRONT_ORDER_RETRIES").ok(), DEFAULT_ORDER_RETRIES);
        let create_db = parse_boolean_flag(env::var("STOREFRONT_CREATE_DB").ok(), true);
        Self { database_url, max_connections, busy_timeout, order_retries, create_db }
    }

    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database_url = url;
        }
        self
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            busy_timeout: self.busy_timeout,
            create_if_missing: self.create_db,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.order_retries, RETRY_BACKOFF)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_url_overrides_config() {
        let config = StorefrontConfig::default().with_database_url(Some("sqlite://other.db".into()));
        assert_eq!(config.database_url, "sqlite://other.db");
        let config = StorefrontConfig::default().with_database_url(None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn derived_settings() {
        let config = StorefrontConfig { order_retries: 7, create_db: false, ..Default::default() };
        assert_eq!(config.retry_policy().max_retries, 7);
        let pool = config.pool_settings();
        assert!(!pool.create_if_missing);
        assert_eq!(pool.busy_timeout, DEFAULT_BUSY_TIMEOUT);
        assert_eq!(pool.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
