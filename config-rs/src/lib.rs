//! config-rs/lib.rs
//! Process-level settings for the ticket gateway.
//! Provides port/address resolution and the environment-driven gateway settings.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Load `.env` into the process environment if one exists.
///
/// Runs before logging is set up, so the loaded file is returned for the
/// caller to report.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Load a specific env file; `None` when it is missing or unreadable
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    dotenv::from_path(path).ok().map(|_| path.to_path_buf())
}

/// Get service port from environment variables with proper fallback
///
/// Reads `<SERVICE>_SERVICE_PORT`; an unparsable value falls back to `default_port`.
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    match env::var(&var_name) {
        Ok(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// `<SERVICE>_SERVICE_ADDR` wins when it holds a socket address, with or
/// without an `http://` or `https://` scheme.
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        let trimmed = addr_str
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');
        match trimmed.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from(([0, 0, 0, 0], port))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid(
                "ENV",
                s,
                "expected development, staging or production",
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Origins a browser may call the gateway from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn parse(raw: &str) -> Self {
        let origins = split_list(raw);
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub bind_address: SocketAddr,
    pub environment: Environment,
    pub log_level: String,
    pub allowed_origins: AllowedOrigins,

    /// Account ids tickets are assigned to; empty leaves tickets unassigned
    pub support_team: Vec<String>,
    pub max_body_bytes: usize,

    /// Deadline for a whole request, including the calls made for it
    pub request_timeout: Duration,
}

impl GatewaySettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; the port and address still come from
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("ENV") {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Environment::default(),
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) if !value.trim().is_empty() => parse_log_level(&value)?,
            _ => "info".to_string(),
        };

        let max_body_bytes = parse_positive(&lookup, "MAX_BODY_BYTES", "a positive byte count")?
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        let request_timeout_secs = parse_positive(&lookup, "REQUEST_TIMEOUT_SECS", "a positive number of seconds")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            bind_address: get_bind_address("GATEWAY", DEFAULT_PORT),
            environment,
            log_level,
            allowed_origins: AllowedOrigins::parse(&lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default()),
            support_team: split_list(&lookup("SUPPORT_TEAM_MEMBERS").unwrap_or_default()),
            max_body_bytes,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// `None` when `var` is unset or blank
fn parse_positive<F, T>(lookup: &F, var: &str, expected: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => match value.trim().parse::<T>() {
            Ok(n) if n != T::default() => Ok(Some(n)),
            _ => Err(ConfigError::invalid(var, &value, format!("expected {}", expected))),
        },
        _ => Ok(None),
    }
}

fn parse_log_level(value: &str) -> Result<String, ConfigError> {
    let level = value.trim().to_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
        _ => Err(ConfigError::invalid("LOG_LEVEL", value, "expected trace, debug, info, warn or error")),
    }
}

/// Split a comma list, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
