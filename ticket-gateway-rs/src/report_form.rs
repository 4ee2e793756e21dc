//! Multipart issue reports.
//!
//! The browser widget posts a form with the reporter's text fields, the
//! failed network calls as a raw JSON string and an optional screenshot in
//! `image0`. The form is turned into the same `DiagnosticReport` the JSON
//! endpoint accepts.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use serde_json::{Map, Value};

use ticket_engine::normalizer::{DESCRIPTION_KEY, ISSUE_KEY, LEAD_ID_KEY, PRODUCT_KEY, USER_EMAIL_KEY};
use ticket_engine::network_calls::{resolve_network_calls, NETWORK_CALLS_KEY};
use ticket_engine::DiagnosticReport;

use crate::validation::ApiValidationError;

pub const IMAGE_FIELD: &str = "image0";

/// Image link used when a screenshot arrives but no storage is configured
pub const PLACEHOLDER_IMAGE_URL: &str = "https://example.com/placeholder.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// What became of the screenshot part of a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screenshot {
    /// No file was sent; the client-supplied `imageS3URL` is used if present
    NotSent,
    Stored(String),

    /// The file could not be stored; the ticket carries no image
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub issue: String,
    pub description: String,
    pub user_email: String,
    pub lead_id: String,
    pub product: String,
    pub failed_network_calls: String,
    pub page_url: String,

    /// Link supplied by a client that uploaded the screenshot itself
    pub image_s3_url: String,
    pub image: Option<UploadedImage>,
}

impl ReportForm {
    /// Drain every part of `multipart`; unknown text fields are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiValidationError> {
        let mut form = ReportForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiValidationError::InvalidFormat(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiValidationError::InvalidFormat(e.body_text()))?;

                if bytes.is_empty() {
                    log::debug!("empty {} part ignored", IMAGE_FIELD);
                    continue;
                }

                log::debug!("received screenshot {} ({} bytes, {})", file_name, bytes.len(), content_type);
                form.image = Some(UploadedImage {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiValidationError::InvalidFormat(e.body_text()))?;

            match name.as_str() {
                "issue" => form.issue = value,
                "description" => form.description = value,
                "userEmail" => form.user_email = value,
                "leadId" => form.lead_id = value,
                "product" => form.product = value,
                "failedNetworkCalls" => form.failed_network_calls = value,
                "pageUrl" => form.page_url = value,
                "imageS3URL" => form.image_s3_url = value,
                other => log::debug!("ignoring form field {}", other),
            }
        }

        Ok(form)
    }

    pub fn validate(&self) -> Result<(), ApiValidationError> {
        if self.issue.trim().is_empty() {
            return Err(ApiValidationError::MissingField("issue".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(ApiValidationError::MissingField("description".to_string()));
        }
        Ok(())
    }

    /// Build the report filed for this form.
    ///
    /// The network-calls text is resolved into its structured form here; the
    /// raw text is kept under `rawNetworkCallsJSON` unless it only read as
    /// generic JSON.
    pub fn into_report(self, screenshot: Screenshot) -> DiagnosticReport {
        let mut payload = Map::new();
        payload.insert(ISSUE_KEY.to_string(), Value::String(self.issue));
        payload.insert(DESCRIPTION_KEY.to_string(), Value::String(self.description));
        payload.insert(USER_EMAIL_KEY.to_string(), Value::String(self.user_email));
        payload.insert(LEAD_ID_KEY.to_string(), Value::String(self.lead_id));
        payload.insert(PRODUCT_KEY.to_string(), Value::String(self.product));
        payload.insert(NETWORK_CALLS_KEY.to_string(), Value::String(self.failed_network_calls));
        resolve_network_calls(&mut payload);

        let mut response = Map::new();
        response.insert("status".to_string(), Value::String("reported".to_string()));

        let mut request_headers = BTreeMap::new();
        request_headers.insert("Content-Type".to_string(), "multipart/form-data".to_string());

        let image_reference = match screenshot {
            Screenshot::Stored(url) => Some(url),
            Screenshot::NotSent => Some(self.image_s3_url).filter(|url| !url.trim().is_empty()),
            Screenshot::Failed => None,
        };

        DiagnosticReport {
            url: self.page_url,
            payload,
            response,
            request_headers,
            image_reference,
        }
    }
}
