//! Service-specific client implementations
//!
//! This module contains the clients for the ticket service's collaborators.

pub mod jira;
pub mod s3;
pub mod store;
mod common;

pub use common::UserAgent;
