//! Configuration management
//!
//! Settings come from the environment (optionally via a `.env` file) with
//! the defaults below; command-line flags override them in `main`.

use jobfeed_common::{JobfeedError, Result};
use std::str::FromStr;

use crate::load::{TableRef, WriteMode, DEFAULT_CHUNK_SIZE, DEFAULT_SCHEMA};

// ============================================================================
// Fetch Configuration Constants
// ============================================================================

/// Job search endpoint.
pub const DEFAULT_API_URL: &str = "https://linkedin-data-scraper.p.rapidapi.com/search_jobs";

/// Value sent in the `x-rapidapi-host` header.
pub const DEFAULT_API_HOST: &str = "linkedin-data-scraper.p.rapidapi.com";

/// Job title searched for.
pub const DEFAULT_KEYWORDS: &str = "Data Engineer";

/// Location searched in.
pub const DEFAULT_LOCATION: &str = "London, United Kingdom";

/// Number of listings requested.
pub const DEFAULT_COUNT: u32 = 50;

/// HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Database / Load Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/linkedin_joblist";

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default destination table.
pub const DEFAULT_TABLE: &str = "new_linkedin_table";

/// Full application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub fetch: FetchConfig,
    pub database: DatabaseConfig,
    pub load: LoadConfig,
}

/// Search API request settings
#[derive(Clone)]
pub struct FetchConfig {
    pub api_url: String,
    pub api_host: String,
    /// Passed through as `x-rapidapi-key`; never logged
    pub api_key: Option<String>,
    pub keywords: String,
    pub location: String,
    pub count: u32,
    pub timeout_secs: u64,
}

/// Destination database settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
}

/// Destination table settings
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub table: TableRef,
    pub mode: WriteMode,
    pub chunk_size: usize,
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from the environment and defaults
    pub fn from_env() -> Result<Self> {
        let schema = env_or("JOBFEED_SCHEMA", DEFAULT_SCHEMA);
        let table = env_or("JOBFEED_TABLE", DEFAULT_TABLE);

        let config = Config {
            fetch: FetchConfig {
                api_url: env_or("JOBFEED_API_URL", DEFAULT_API_URL),
                api_host: env_or("JOBFEED_API_HOST", DEFAULT_API_HOST),
                api_key: std::env::var("JOBFEED_API_KEY").ok().filter(|k| !k.is_empty()),
                keywords: env_or("JOBFEED_KEYWORDS", DEFAULT_KEYWORDS),
                location: env_or("JOBFEED_LOCATION", DEFAULT_LOCATION),
                count: env_parse("JOBFEED_COUNT", DEFAULT_COUNT)?,
                timeout_secs: env_parse("JOBFEED_HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT_SECS)?,
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
                connect_timeout_secs: env_parse(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
            },
            load: LoadConfig {
                table: TableRef::new(schema, table),
                mode: env_parse("JOBFEED_WRITE_MODE", WriteMode::Append)?,
                chunk_size: env_parse("JOBFEED_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;

        if self.database.url.is_empty() {
            return Err(JobfeedError::config("Database URL cannot be empty"));
        }

        if self.load.table.name.is_empty() || self.load.table.schema.is_empty() {
            return Err(JobfeedError::config("Destination table and schema cannot be empty"));
        }

        if self.load.chunk_size == 0 {
            return Err(JobfeedError::config("Chunk size must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            load: LoadConfig {
                table: TableRef::named(DEFAULT_TABLE),
                mode: WriteMode::Append,
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
        }
    }
}

impl FetchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(JobfeedError::config("API URL cannot be empty"));
        }

        if self.count == 0 {
            return Err(JobfeedError::config("Result count must be greater than 0"));
        }

        if self.timeout_secs == 0 {
            return Err(JobfeedError::config("HTTP timeout must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: None,
            keywords: DEFAULT_KEYWORDS.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            count: DEFAULT_COUNT,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("api_url", &self.api_url)
            .field("api_host", &self.api_host)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("keywords", &self.keywords)
            .field("location", &self.location)
            .field("count", &self.count)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &crate::load::postgres::redact_url(&self.url))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| JobfeedError::invalid_setting(key, raw)),
        Err(_) => Ok(default),
    }
}
