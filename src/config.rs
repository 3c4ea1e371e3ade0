use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use tracing::info;

pub const POSTS_PER_PAGE: u64 = 10;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_USERNAME_LENGTH: usize = 150;

pub const SESSION_COOKIE: &str = "sessionid";
pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_hours: i64,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            host: try_load("NETWORK_HOST", "0.0.0.0")?,
            port: try_load("NETWORK_PORT", "8000")?,
            database_url: try_load("NETWORK_DATABASE_URL", "sqlite://network.db?mode=rwc")?,
            session_hours: try_load("NETWORK_SESSION_HOURS", "24")?,
            seed_demo_data: try_load("NETWORK_SEED_DEMO_DATA", "false")?,
        })
    }

    /// In-memory database with default session lifetime, no demo data.
    pub fn in_memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            session_hours: 24,
            seed_demo_data: false,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
