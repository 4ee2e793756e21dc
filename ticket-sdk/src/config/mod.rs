//! Configuration management for collaborator clients
//!
//! This module provides utilities for loading and validating the credentials
//! and endpoints of the ticket system, object storage and ticket store, with
//! support for environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get an optional, non-empty string value
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub(crate) fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider (unprefixed environment)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Jira connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Jira site, e.g. `https://your-team.atlassian.net`
    pub base_url: String,

    /// Account used for basic auth
    pub username: String,

    /// API token paired with the username
    pub api_token: String,

    /// Project tickets are filed under
    pub project_key: String,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            api_token: String::new(),
            project_key: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl JiraConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: provider.get_string("jira_url")?,
            username: provider.get_string("jira_username")?,
            api_token: provider.get_string("jira_api_token")?,
            project_key: provider.get_string("jira_project_key")?,
            timeout_seconds: provider.get_int_or("jira_timeout_seconds", 30).max(1) as u64,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for JiraConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("Jira URL is required"));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid Jira URL {}: {}", self.base_url, e)))?;

        if self.username.is_empty() || self.api_token.is_empty() {
            return Err(ServiceError::configuration("Jira username and API token are required"));
        }

        if self.project_key.is_empty() {
            return Err(ServiceError::configuration("Jira project key is required"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "jira"
    }
}

/// S3-compatible object storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,

    /// Public base URL used when a presigned link cannot be produced
    pub base_url: Option<String>,

    /// Custom endpoint (MinIO, localstack); virtual-hosted AWS style when absent
    pub endpoint: Option<String>,

    /// Folder under `uploads/` objects are written to
    pub key_prefix: String,

    /// Lifetime of presigned download links in seconds
    pub presign_expiry_seconds: u64,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

/// Seven days, the longest lifetime SigV4 allows for a presigned URL
pub const DEFAULT_PRESIGN_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;

impl Default for S3Config {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".to_string(),
            bucket: String::new(),
            base_url: None,
            endpoint: None,
            key_prefix: "tickets".to_string(),
            presign_expiry_seconds: DEFAULT_PRESIGN_EXPIRY_SECONDS,
            timeout_seconds: 30,
        }
    }
}

impl S3Config {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            access_key: provider.get_string("aws_s3_access_key")?,
            secret_key: provider.get_string("aws_s3_secret_key")?,
            region: provider.get_string("aws_s3_region")?,
            bucket: provider.get_string("aws_s3_bucket_name")?,
            base_url: provider.get_optional("aws_s3_base_url"),
            endpoint: provider.get_optional("aws_s3_endpoint"),
            key_prefix: provider.get_string_or("aws_s3_key_prefix", "tickets"),
            presign_expiry_seconds: DEFAULT_PRESIGN_EXPIRY_SECONDS,
            timeout_seconds: provider.get_int_or("aws_s3_timeout_seconds", 30).max(1) as u64,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for S3Config {
    fn validate(&self) -> Result<()> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(ServiceError::configuration("S3 access key and secret key are required"));
        }

        if self.region.is_empty() {
            return Err(ServiceError::configuration("S3 region is required"));
        }

        if self.bucket.is_empty() {
            return Err(ServiceError::configuration("S3 bucket name is required"));
        }

        if self.presign_expiry_seconds == 0 || self.presign_expiry_seconds > DEFAULT_PRESIGN_EXPIRY_SECONDS {
            return Err(ServiceError::configuration(
                "Presign expiry must be between 1 second and 7 days",
            ));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "s3"
    }
}

/// NDJSON ticket store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/tickets/tickets.ndjson"),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = match provider.get_optional("ticket_store_path") {
            Some(path) => Self { path: PathBuf::from(path) },
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for StoreConfig {
    fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ServiceError::configuration("Ticket store path is required"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "ticket-store"
    }
}
