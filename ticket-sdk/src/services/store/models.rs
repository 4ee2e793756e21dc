//! Persisted ticket projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat record of one filed ticket.
///
/// Structured report fields are kept as JSON strings so the record stays
/// readable regardless of how the report was shaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedTicket {
    /// Store id; assigned on save when empty
    #[serde(default)]
    pub id: String,

    pub ticket_id: String,
    pub status: String,
    pub assigned_to: String,
    pub jira_link: String,
    pub created_at: DateTime<Utc>,

    // Issue details
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub lead_id: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub image_url: String,

    // JSON renditions of the structured report fields
    #[serde(default)]
    pub failed_network_calls_json: String,
    #[serde(default)]
    pub payload_json: String,
    #[serde(default)]
    pub response_json: String,
    #[serde(default)]
    pub request_headers_json: String,
}
