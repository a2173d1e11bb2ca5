use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::scheduling::CapabilityDefault;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub availability: AvailabilityConfig,
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
            availability: AvailabilityConfig::from_env()?,
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

/// Knobs for the availability engine's fan-out of staff checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityConfig {
    /// Upper bound for a single staff availability check.
    pub check_timeout: Duration,
    /// Maximum number of staff checks in flight for one request.
    pub max_concurrent_checks: usize,
    /// How a missing staff-service mapping row is interpreted.
    pub unmapped_capability: CapabilityDefault,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_millis(2_000),
            max_concurrent_checks: 16,
            unmapped_capability: CapabilityDefault::Allow,
        }
    }
}

impl AvailabilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let check_timeout = match env::var("HOME_VISIT_CHECK_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::InvalidCheckTimeout)?,
            Err(_) => defaults.check_timeout,
        };

        let max_concurrent_checks = match env::var("HOME_VISIT_MAX_CONCURRENT_CHECKS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidConcurrency)?,
            Err(_) => defaults.max_concurrent_checks,
        };

        let unmapped_capability = match env::var("HOME_VISIT_UNMAPPED_CAPABILITY") {
            Ok(raw) => CapabilityDefault::parse(&raw)
                .ok_or(ConfigError::InvalidCapabilityDefault { value: raw })?,
            Err(_) => defaults.unmapped_capability,
        };

        Ok(Self {
            check_timeout,
            max_concurrent_checks,
            unmapped_capability,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCheckTimeout,
    InvalidConcurrency,
    InvalidCapabilityDefault { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCheckTimeout => {
                write!(f, "HOME_VISIT_CHECK_TIMEOUT_MS must be a positive integer")
            }
            ConfigError::InvalidConcurrency => {
                write!(f, "HOME_VISIT_MAX_CONCURRENT_CHECKS must be at least 1")
            }
            ConfigError::InvalidCapabilityDefault { value } => write!(
                f,
                "HOME_VISIT_UNMAPPED_CAPABILITY must be 'allow' or 'deny' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCheckTimeout
            | ConfigError::InvalidConcurrency
            | ConfigError::InvalidCapabilityDefault { .. } => None,
        }
    }
}
