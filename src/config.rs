use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FEED_URL: &str = "https://api.coindesk.com/v1/bpi/currentprice.json";
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LANG: &str = "en-us";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub rate_feed_url: String,
    pub rate_feed_timeout: Duration,
    pub default_lang: String,
}

impl AppConfig {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {}", value))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let timeout_secs = match var("RATE_FEED_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("RATE_FEED_TIMEOUT_SECS is not a number: {}", value))?,
            None => DEFAULT_FEED_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("RATE_FEED_TIMEOUT_SECS must be positive");
        }

        Ok(Self {
            database_url,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            db_max_connections,
            rate_feed_url: var("RATE_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            rate_feed_timeout: Duration::from_secs(timeout_secs),
            default_lang: var("DEFAULT_LANG")
                .map(|lang| lang.trim().to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
        })
    }
}
