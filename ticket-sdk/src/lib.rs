//! # Ticket SDK
//!
//! Collaborator contracts and clients for the diagnostic ticket service.
//!
//! This crate provides:
//!
//! - Core abstractions for the ticket system, object storage and ticket store
//! - Typed clients for Jira and S3 plus an NDJSON ticket store
//! - Comprehensive error handling system
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! - `ServiceClient`: identity and health of a remote collaborator
//! - `TicketSystem`: files issues and comments (`JiraClient`)
//! - `ObjectStorage`: uploads screenshots and returns links (`S3Client`)
//! - `TicketStore`: persists flattened tickets (`FileTicketStore`)
//! - `ServiceError`: Comprehensive error handling system

// Re-export core modules
pub mod core;
pub use core::{CreatedIssue, NewIssue, ObjectStorage, ServiceClient, TicketStore, TicketSystem};

// Re-export service-specific modules
pub mod services;
pub use services::{jira, s3, store};
pub use services::jira::JiraClient;
pub use services::s3::S3Client;
pub use services::store::{FileTicketStore, FlattenedTicket};

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ConfigProviderExt, JiraConfig, S3Config, ServiceConfig, StoreConfig};

pub mod util;

#[cfg(test)]
mod tests;

/// Create a pre-configured Jira client from the environment
pub fn jira_client() -> Result<JiraClient> {
    JiraClient::from_env()
}

/// Create a pre-configured S3 client from the environment
pub fn s3_client() -> Result<S3Client> {
    S3Client::from_env()
}
