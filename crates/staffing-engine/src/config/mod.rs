use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

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
}

/// Top-level configuration for the engine host.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            engine: EngineConfig::from_env()?,
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

/// Output layout for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Lifecycle dials for offers, payment codes, ranking and reputation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub offer_ttl_days: i64,
    pub payment_code_ttl_minutes: i64,
    pub sweep_interval_secs: u64,
    pub quick_search_limit: usize,
    pub manual_search_limit: usize,
    pub default_reputation: u8,
    pub jitter_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offer_ttl_days: 30,
            payment_code_ttl_minutes: 10,
            sweep_interval_secs: 60,
            quick_search_limit: 20,
            manual_search_limit: 10,
            default_reputation: 100,
            jitter_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let offer_ttl_days = read_var("ENGINE_OFFER_TTL_DAYS", defaults.offer_ttl_days)?;
        let payment_code_ttl_minutes = read_var(
            "ENGINE_PAYMENT_CODE_TTL_MINUTES",
            defaults.payment_code_ttl_minutes,
        )?;
        if offer_ttl_days <= 0 {
            return Err(ConfigError::InvalidEngineSetting {
                name: "ENGINE_OFFER_TTL_DAYS",
                value: offer_ttl_days.to_string(),
            });
        }
        if payment_code_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidEngineSetting {
                name: "ENGINE_PAYMENT_CODE_TTL_MINUTES",
                value: payment_code_ttl_minutes.to_string(),
            });
        }

        let default_reputation =
            read_var("ENGINE_DEFAULT_REPUTATION", defaults.default_reputation)?;
        if default_reputation > 100 {
            return Err(ConfigError::InvalidEngineSetting {
                name: "ENGINE_DEFAULT_REPUTATION",
                value: default_reputation.to_string(),
            });
        }

        let jitter_seed = match env::var("ENGINE_JITTER_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>().map_err(
                |_| ConfigError::InvalidEngineSetting {
                    name: "ENGINE_JITTER_SEED",
                    value: raw.clone(),
                },
            )?),
            _ => None,
        };

        Ok(Self {
            offer_ttl_days,
            payment_code_ttl_minutes,
            sweep_interval_secs: read_var(
                "ENGINE_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?
            .max(1),
            quick_search_limit: read_var("ENGINE_QUICK_SEARCH_LIMIT", defaults.quick_search_limit)?,
            manual_search_limit: read_var(
                "ENGINE_MANUAL_SEARCH_LIMIT",
                defaults.manual_search_limit,
            )?,
            default_reputation,
            jitter_seed,
        })
    }

    pub fn offer_ttl(&self) -> Duration {
        Duration::days(self.offer_ttl_days)
    }

    pub fn payment_code_ttl(&self) -> Duration {
        Duration::minutes(self.payment_code_ttl_minutes)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

fn read_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidEngineSetting { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEngineSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEngineSetting { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidEngineSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
