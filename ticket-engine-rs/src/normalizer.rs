//! Canonical fields pulled out of the loosely typed report payload.

use serde_json::{Map, Value};

use crate::model::DiagnosticReport;

pub const ISSUE_KEY: &str = "issue";
pub const DESCRIPTION_KEY: &str = "description";
pub const USER_EMAIL_KEY: &str = "userEmail";
pub const LEAD_ID_KEY: &str = "leadId";
pub const PRODUCT_KEY: &str = "product";
pub const PAGE_URL_KEY: &str = "url";
pub const IMAGE_KEY: &str = "imageS3URL";

/// Fields that make up the never-truncated part of a ticket.
///
/// Empty strings mean "absent"; the renderer omits the matching lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    pub issue: String,
    pub description: String,
    pub user_email: String,
    pub lead_id: String,
    pub product: String,
    pub page_url: String,
    pub image_reference: Option<String>,
}

pub fn normalize(report: &DiagnosticReport) -> NormalizedFields {
    let payload = &report.payload;

    let page_url = field_text(payload, PAGE_URL_KEY).unwrap_or_else(|| report.url.clone());

    let image_reference = report
        .image_reference
        .clone()
        .or_else(|| field_text(payload, IMAGE_KEY))
        .filter(|r| is_valid_image_reference(r));

    NormalizedFields {
        issue: field_text(payload, ISSUE_KEY).unwrap_or_default(),
        description: field_text(payload, DESCRIPTION_KEY).unwrap_or_default(),
        user_email: field_text(payload, USER_EMAIL_KEY).unwrap_or_default(),
        lead_id: field_text(payload, LEAD_ID_KEY).unwrap_or_default(),
        product: field_text(payload, PRODUCT_KEY).unwrap_or_default(),
        page_url,
        image_reference,
    }
}

/// Scalar payload field as text; containers and null count as absent
pub fn field_text(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Clients send the literals `None`/`null` when no screenshot was taken
pub fn is_valid_image_reference(reference: &str) -> bool {
    !matches!(reference, "" | "None" | "null")
}
