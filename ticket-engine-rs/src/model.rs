//! Request and result types exchanged with callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A diagnostic report as submitted by a client.
///
/// `payload` and `response` are free-form; nothing about their shape is
/// assumed beyond being JSON objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub url: String,

    #[serde(default)]
    pub payload: Map<String, Value>,

    #[serde(default)]
    pub response: Map<String, Value>,

    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    #[serde(default, rename = "imageS3URL", skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
}

/// Outcome of a successful ticket creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub ticket_id: String,
    pub status: String,
    pub assigned_to: String,
    pub jira_link: String,
}

pub const STATUS_CREATED: &str = "created";
