use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Page fetching configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Politeness delay applied before every request
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Ordered CSS selector lists, one per extracted field.
///
/// Selectors are tried in order and the first match wins, so a markup change
/// on the target site only needs a new entry here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub price: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub fetcher: FetcherConfig,
    pub selectors: SelectorConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub http_host: String,
    pub http_port: u16,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

/// Split a `;`-separated selector list, dropping empty entries
fn parse_selector_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://price_tracker.db".to_string());

        let max_connections = env_parse::<u32>("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let acquire_timeout_secs = env_parse::<u64>("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(30);
        let idle_timeout_secs = env_parse::<u64>("DATABASE_IDLE_TIMEOUT_SECS").unwrap_or(600); // 10 minutes
        let max_lifetime_secs = env_parse::<u64>("DATABASE_MAX_LIFETIME_SECS").unwrap_or(1800); // 30 minutes

        let config = Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if self.acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// An in-memory database lives and dies with its single connection
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://price_tracker.db".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl FetcherConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let request_delay_ms = env_parse::<u64>("FETCH_DELAY_MS").unwrap_or(defaults.request_delay_ms);
        let timeout_secs = env_parse::<u64>("FETCH_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs);
        let user_agent = env::var("FETCH_USER_AGENT").unwrap_or(defaults.user_agent);

        if timeout_secs == 0 {
            return Err("FETCH_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            request_delay_ms,
            timeout_secs,
            user_agent,
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SelectorConfig {
    /// Default table, then any `*_SELECTORS` overrides from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("TITLE_SELECTORS") {
            config.title = parse_selector_list(&raw);
        }
        if let Ok(raw) = env::var("DESCRIPTION_SELECTORS") {
            config.description = parse_selector_list(&raw);
        }
        if let Ok(raw) = env::var("PRICE_SELECTORS") {
            config.price = parse_selector_list(&raw);
        }

        config
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: vec!["span.B_NuCI".to_string(), "h1.yhB1nd".to_string()],
            description: vec!["div._1mXcCf".to_string(), "div._1AN87F".to_string()],
            price: vec!["div._30jeq3".to_string(), "div._30jeq3._16Jk6d".to_string()],
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid LOG_FORMAT: {}. Must be one of: pretty, json", s)),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;
        let fetcher = FetcherConfig::from_env()?;
        let selectors = SelectorConfig::from_env();

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let log_format = env::var("LOG_FORMAT")
            .map(|s| s.parse::<LogFormat>())
            .unwrap_or(Ok(LogFormat::Pretty))?;

        let http_host = env::var("HTTP_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let http_port = env_parse::<u16>("HTTP_PORT").unwrap_or(8002);

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        Ok(Self {
            database,
            fetcher,
            selectors,
            log_level: log_level.to_lowercase(),
            log_format,
            http_host,
            http_port,
        })
    }

    /// Socket address string for the HTTP listener
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            fetcher: FetcherConfig::default(),
            selectors: SelectorConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            http_host: "0.0.0.0".to_string(),
            http_port: 8002,
        }
    }
}
