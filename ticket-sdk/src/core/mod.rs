//! Core abstractions for the ticket SDK
//!
//! This module provides the contracts the ticket engine talks to:
//!
//! - `ServiceClient`: identity and health of a remote collaborator
//! - `TicketSystem`: issue creation, comments and issue-type metadata
//! - `ObjectStorage`: screenshot uploads returning time-limited links
//! - `TicketStore`: persistence of flattened ticket projections
//!
//! All of them are `Send + Sync` so a single handle can be shared by every
//! in-flight request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::store::FlattenedTicket;

/// Base trait for remote service clients
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;

    /// Health check for the service
    async fn health_check(&self) -> Result<bool>;
}

/// Fields of an issue about to be filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub project_key: String,
    pub issue_type_id: String,
    pub summary: String,
    pub description: String,

    /// Account id of the assignee; empty leaves the issue unassigned
    pub assignee: String,
}

/// Identity of an issue after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Issue key, e.g. `SUP-123`
    pub key: String,

    /// Browser link to the issue
    pub link: String,
}

/// Ticket-system collaborator
#[async_trait]
pub trait TicketSystem: Send + Sync {
    /// Resolve the id of the issue type called `name` in `project`.
    ///
    /// `Ok(None)` means the metadata was readable but held no such type.
    async fn lookup_issue_type_id(&self, project: &str, name: &str) -> Result<Option<String>>;

    /// File a new issue
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    /// Append a comment to an existing issue
    async fn add_comment(&self, ticket_id: &str, body: &str) -> Result<()>;
}

/// Object-storage collaborator
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` and return a link the ticket can embed
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, file_name: &str) -> Result<String>;
}

/// Persistence collaborator for flattened tickets
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a projection and return its store id
    async fn save(&self, ticket: &FlattenedTicket) -> Result<String>;

    /// Find the projection of `ticket_id`; `ServiceError::NotFound` when absent
    async fn find_by_ticket_id(&self, ticket_id: &str) -> Result<FlattenedTicket>;

    /// Every stored projection, oldest first
    async fn find_all(&self) -> Result<Vec<FlattenedTicket>>;
}
