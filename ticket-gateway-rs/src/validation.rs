//! Gateway input validation
//!
//! Request validation and sanitization for the ticket endpoints. Everything
//! here runs before a report reaches the engine; failures become 4xx
//! responses with the shared `{error, details}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use ticket_engine::DiagnosticReport;

use crate::ErrorResponse;

/// Longest accepted report URL, in characters
pub const MAX_URL_LENGTH: usize = 2048;

/// Validation error for gateway requests
#[derive(Debug, thiserror::Error)]
pub enum ApiValidationError {
    #[error("Invalid request body: {0}")]
    InvalidFormat(String),

    #[error("Content type must be {0}")]
    ContentType(String),

    #[error("Request payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ApiValidationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::ContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingField(_) | Self::InvalidField { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Short error label; the message goes to `details`
    fn label(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) | Self::ContentType(_) | Self::PayloadTooLarge(_) => "Invalid request body",
            Self::MissingField(_) | Self::InvalidField { .. } => "Validation failed",
        }
    }

    /// Convert to HTTP status code and error response
    pub fn to_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        (self.status(), Json(ErrorResponse::with_details(self.label(), self.to_string())))
    }
}

impl IntoResponse for ApiValidationError {
    fn into_response(self) -> Response {
        self.to_response().into_response()
    }
}

impl From<JsonRejection> for ApiValidationError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiValidationError::PayloadTooLarge(rejection.body_text()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiValidationError::ContentType("application/json".to_string()),
            _ => ApiValidationError::InvalidFormat(rejection.body_text()),
        }
    }
}

/// Check the fields a ticket request cannot do without
pub fn validate_report(report: &DiagnosticReport) -> Result<(), ApiValidationError> {
    let url = report.url.trim();
    if url.is_empty() {
        return Err(ApiValidationError::MissingField("url".to_string()));
    }

    if url.chars().count() > MAX_URL_LENGTH {
        return Err(ApiValidationError::InvalidField {
            field: "url".to_string(),
            reason: format!("longer than {} characters", MAX_URL_LENGTH),
        });
    }

    Ok(())
}

/// Strip NUL characters from every string in a JSON tree
pub fn sanitize_json_object(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('\u{0000}') {
                *s = s.replace('\u{0000}', "");
            }
        }
        Value::Array(arr) => {
            for item in arr {
                sanitize_json_object(item);
            }
        }
        Value::Object(obj) => {
            for (_, val) in obj {
                sanitize_json_object(val);
            }
        }
        _ => {}
    }
}

/// Apply sanitization to the free-form parts of a report
pub fn sanitize_report(report: &mut DiagnosticReport) {
    for value in report.payload.values_mut().chain(report.response.values_mut()) {
        sanitize_json_object(value);
    }
    for value in report.request_headers.values_mut() {
        value.retain(|c| c != '\u{0000}');
    }
}
