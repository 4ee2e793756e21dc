//! Error mapping for upstream APIs
//!
//! Converts Jira and S3 error responses into the normalized ServiceError type.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

static S3_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Code>([^<]*)</Code>").unwrap());
static S3_MESSAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Message>([^<]*)</Message>").unwrap());

/// Map a status code and message to the matching ServiceError variant
fn by_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::BAD_REQUEST => ServiceError::validation(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        _ => ServiceError::service(message),
    }
}

/// Map a Jira REST error to a ServiceError
///
/// Jira reports failures as `{"errorMessages": [...], "errors": {"field": "reason"}}`.
pub fn map_jira_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "jira".to_string();

    let mut parts: Vec<String> = json
        .get("errorMessages")
        .and_then(|m| m.as_array())
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if let Some(fields) = json.get("errors").and_then(|e| e.as_object()) {
        for (field, reason) in fields {
            let reason = reason.as_str().map(str::to_string).unwrap_or_else(|| reason.to_string());
            context.add(format!("field.{}", field), &reason);
            parts.push(format!("{}: {}", field, reason));
        }
    }

    let message = if parts.is_empty() {
        json.get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown Jira error")
            .to_string()
    } else {
        parts.join("; ")
    };

    by_status(status, message)
}

/// Map an S3 XML error document to a ServiceError
pub fn map_s3_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    context.service = "s3".to_string();

    let code = S3_CODE.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str());
    let message = S3_MESSAGE.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str());

    if let Some(code) = code {
        context.add("s3_code", code);
    }

    let text = match (code, message) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => status.to_string(),
    };

    match code {
        Some("NoSuchKey") | Some("NoSuchBucket") => ServiceError::not_found(text),
        Some("SignatureDoesNotMatch") | Some("InvalidAccessKeyId") => ServiceError::authentication(text),
        Some("AccessDenied") => ServiceError::authorization(text),
        _ => by_status(status, text),
    }
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if context.service == "s3" {
        return map_s3_error(status, body, context);
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if context.service == "jira" {
            return map_jira_error(status, &json, context);
        }

        let message = json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(|m| m.as_str())
            .unwrap_or(body);
        return by_status(status, message);
    }

    // Fallback to status-based mapping
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, crate::util::preview(body, 100))
    };

    by_status(status, message)
}
