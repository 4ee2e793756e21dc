//! Utility module for common functionality
//!
//! Small helpers shared by the collaborator clients and their callers.

/// Char-safe prefix of `s`, at most `max_chars` long, with an ellipsis when cut
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

/// Sanitize a string for logging (remove sensitive data patterns)
pub fn sanitize_for_logging(s: &str) -> String {
    let patterns = [
        (r"Bearer [A-Za-z0-9\-_.]+", "Bearer [REDACTED]"),
        (r"Basic [A-Za-z0-9+/=]+", "Basic [REDACTED]"),
        (r"X-Amz-Signature=[0-9a-f]+", "X-Amz-Signature=[REDACTED]"),
        (r"(?i)api[_-]?token[=:]\s*[A-Za-z0-9\-_]+", "api_token=[REDACTED]"),
        (r"(?i)password[=:]\s*[^\s&]+", "password=[REDACTED]"),
        (r"(?i)secret[=:]\s*[^\s&]+", "secret=[REDACTED]"),
    ];

    let mut result = s.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            result = re.replace_all(&result, replacement).to_string();
        }
    }
    result
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
