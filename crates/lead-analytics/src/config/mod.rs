use crate::analytics::{
    GroupBy, OptionParseError, OrderPolicy, TimeWindow, DEFAULT_COMPLETION_STAGE,
};
use chrono::{DateTime, Datelike, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub analytics: AnalyticsConfig,
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
            analytics: AnalyticsConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Order definition and default filters, fixed for the whole deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub completion_stage_label: String,
    pub require_positive_amount: bool,
    pub time_window: TimeWindow,
    pub group_by: GroupBy,
    /// `None` means the calendar year at the time of each call.
    pub target_year: Option<i32>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            completion_stage_label: DEFAULT_COMPLETION_STAGE.to_string(),
            require_positive_amount: false,
            time_window: TimeWindow::Unrestricted,
            group_by: GroupBy::Agent,
            target_year: None,
        }
    }
}

impl AnalyticsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let completion_stage_label = env::var("LEADS_COMPLETION_STAGE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.completion_stage_label);

        let time_window = match env::var("LEADS_TIME_WINDOW") {
            Ok(value) => value.parse::<TimeWindow>().map_err(|source| ConfigError::InvalidOption {
                variable: "LEADS_TIME_WINDOW",
                source,
            })?,
            Err(_) => defaults.time_window,
        };

        let group_by = match env::var("LEADS_GROUP_BY") {
            Ok(value) => value.parse::<GroupBy>().map_err(|source| ConfigError::InvalidOption {
                variable: "LEADS_GROUP_BY",
                source,
            })?,
            Err(_) => defaults.group_by,
        };

        let target_year = match env::var("LEADS_TARGET_YEAR") {
            Ok(value) => Some(
                value
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| ConfigError::InvalidYear { value })?,
            ),
            Err(_) => None,
        };

        let require_positive_amount = match env::var("LEADS_REQUIRE_POSITIVE_AMOUNT") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                variable: "LEADS_REQUIRE_POSITIVE_AMOUNT",
                value,
            })?,
            Err(_) => defaults.require_positive_amount,
        };

        Ok(Self {
            completion_stage_label,
            require_positive_amount,
            time_window,
            group_by,
            target_year,
        })
    }

    pub fn order_policy(&self) -> OrderPolicy {
        OrderPolicy::new(&self.completion_stage_label)
            .requiring_positive_amount(self.require_positive_amount)
    }

    pub fn resolve_year(&self, now: DateTime<Utc>) -> i32 {
        self.target_year.unwrap_or_else(|| now.year())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidOption {
        variable: &'static str,
        source: OptionParseError,
    },
    InvalidYear {
        value: String,
    },
    InvalidFlag {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidOption { variable, source } => {
                write!(f, "{variable} is not recognised: {source}")
            }
            ConfigError::InvalidYear { value } => {
                write!(f, "LEADS_TARGET_YEAR must be a year, got '{value}'")
            }
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{variable} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidOption { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidYear { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
