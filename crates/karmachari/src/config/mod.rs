use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Default lifetime of a success notification, in milliseconds.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 4_000;
/// Default number of entries retained by the rolling activity feed.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

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

/// Top-level configuration for the portal service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
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
        let log_format = env::var("APP_LOG_FORMAT")
            .map(|raw| LogFormat::from_str(&raw))
            .unwrap_or(LogFormat::Compact);

        let notification_ttl_ms = match env::var("KARMACHARI_NOTIFICATION_TTL_MS") {
            Ok(raw) => parse_positive(&raw).ok_or(ConfigError::InvalidNotificationTtl)?,
            Err(_) => DEFAULT_NOTIFICATION_TTL_MS,
        };
        let activity_capacity = match env::var("KARMACHARI_ACTIVITY_CAPACITY") {
            Ok(raw) => parse_positive(&raw).ok_or(ConfigError::InvalidActivityCapacity)? as usize,
            Err(_) => DEFAULT_ACTIVITY_CAPACITY,
        };
        let seed_demo_data = match env::var("KARMACHARI_SEED_DEMO") {
            Ok(raw) => parse_flag(&raw),
            Err(_) => environment != AppEnvironment::Production,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            workflow: WorkflowConfig {
                notification_ttl_ms,
                activity_capacity,
                seed_demo_data,
            },
        })
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value > 0)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
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

/// Output style for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
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

/// Tunables for the verification workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub notification_ttl_ms: u64,
    pub activity_capacity: usize,
    pub seed_demo_data: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            seed_demo_data: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNotificationTtl,
    InvalidActivityCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNotificationTtl => write!(
                f,
                "KARMACHARI_NOTIFICATION_TTL_MS must be a positive number of milliseconds"
            ),
            ConfigError::InvalidActivityCapacity => {
                write!(f, "KARMACHARI_ACTIVITY_CAPACITY must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNotificationTtl
            | ConfigError::InvalidActivityCapacity => None,
        }
    }
}
