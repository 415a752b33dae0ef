use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Short name embedded in versioned index names.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Test => "test",
            Self::Production => "prod",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub index: IndexConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            index: IndexConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Search index target and bulk indexing knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub alias: String,
    pub mappings_version: String,
    pub chunk_size: usize,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Upper bound on a single index call before it counts as timed out.
    pub timeout_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            alias: "bsds".to_string(),
            mappings_version: "v1".to_string(),
            chunk_size: 500,
            concurrency: 4,
            max_retries: 3,
            retry_backoff_ms: 200,
            timeout_ms: 10_000,
        }
    }
}

impl IndexConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let alias = env::var("INDEX_ALIAS").unwrap_or(defaults.alias);
        let mappings_version =
            env::var("INDEX_MAPPINGS_VERSION").unwrap_or(defaults.mappings_version);
        // Index names are `_`-separated, so the version must not contain one.
        if mappings_version.trim().is_empty() || mappings_version.contains('_') {
            return Err(ConfigError::InvalidMappingsVersion {
                value: mappings_version,
            });
        }
        let chunk_size = positive_var("INDEX_CHUNK_SIZE", defaults.chunk_size)?;
        let concurrency = positive_var("INDEX_CONCURRENCY", defaults.concurrency)?;
        let max_retries = match env::var("INDEX_MAX_RETRIES") {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                name: "INDEX_MAX_RETRIES",
            })?,
            Err(_) => defaults.max_retries,
        };
        let retry_backoff_ms = match env::var("INDEX_RETRY_BACKOFF_MS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: "INDEX_RETRY_BACKOFF_MS",
            })?,
            Err(_) => defaults.retry_backoff_ms,
        };
        let timeout_ms = positive_var("INDEX_TIMEOUT_MS", defaults.timeout_ms)?;

        Ok(Self {
            alias,
            mappings_version,
            chunk_size,
            concurrency,
            max_retries,
            retry_backoff_ms,
            timeout_ms,
        })
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn positive_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + From<u8>,
{
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value == T::from(0) => Err(ConfigError::NotPositive { name }),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::InvalidNumber { name }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    NotPositive { name: &'static str },
    InvalidMappingsVersion { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => write!(f, "{name} must be an integer"),
            ConfigError::NotPositive { name } => write!(f, "{name} must be a positive integer"),
            ConfigError::InvalidMappingsVersion { value } => write!(
                f,
                "INDEX_MAPPINGS_VERSION '{value}' must be non-empty and free of underscores"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::NotPositive { .. }
            | ConfigError::InvalidMappingsVersion { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
