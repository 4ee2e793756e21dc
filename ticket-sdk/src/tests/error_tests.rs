//! Tests for error handling functionality
//!
//! These tests verify that the error system in the SDK works correctly.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::error::{mapping, ErrorContext, ServiceError};

    #[test]
    fn test_service_error_creation() {
        let network_err = ServiceError::network("Connection failed");
        let auth_err = ServiceError::authentication("Invalid credentials");
        let storage_err = ServiceError::storage("disk full");

        assert_eq!(network_err.to_string(), "Network error: Connection failed");
        assert_eq!(auth_err.to_string(), "Authentication error: Invalid credentials");
        assert_eq!(storage_err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::for_service("jira")
            .status_code(404)
            .endpoint("issue/SUP-1");

        let err = ServiceError::not_found("no issue").with_context(context);

        // Display passes through to the inner error
        assert_eq!(err.to_string(), "Not found: no issue");
        if let ServiceError::WithContext { context, .. } = &err {
            assert_eq!(context.service, "jira");
            assert_eq!(context.endpoint.as_deref(), Some("issue/SUP-1"));
        }
        assert_eq!(err.status_code(), Some(404));
        assert!(err.is_not_found());

        match err.root() {
            ServiceError::NotFound(message) => assert_eq!(message, "no issue"),
            other => panic!("unexpected root error: {:?}", other),
        }
    }

    #[test]
    fn test_with_context_value() {
        let err = ServiceError::storage("write failed").with_context_value("path", "/tmp/x");

        if let ServiceError::WithContext { context, .. } = &err {
            assert_eq!(context.data.get("path").map(String::as_str), Some("/tmp/x"));
        } else {
            panic!("expected context wrapper");
        }
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_map_jira_error() {
        let body = json!({
            "errorMessages": ["Issue type is required"],
            "errors": {"summary": "Summary must be less than 255 characters."}
        });
        let mut context = ErrorContext::new();

        let err = mapping::map_jira_error(StatusCode::BAD_REQUEST, &body, &mut context);

        assert!(matches!(err, ServiceError::Validation(_)));
        let text = err.to_string();
        assert!(text.contains("Issue type is required"));
        assert!(text.contains("summary: Summary must be less than 255 characters."));
        assert_eq!(context.service, "jira");
        assert!(context.data.contains_key("field.summary"));
    }

    #[test]
    fn test_map_s3_error() {
        let body = "<?xml version=\"1.0\"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";
        let mut context = ErrorContext::new();

        let err = mapping::map_s3_error(StatusCode::FORBIDDEN, body, &mut context);

        assert!(matches!(err, ServiceError::Authorization(_)));
        assert_eq!(err.to_string(), "Authorization error: AccessDenied: Access Denied");
        assert_eq!(context.data.get("s3_code").map(String::as_str), Some("AccessDenied"));

        let body = "<Error><Code>NoSuchBucket</Code></Error>";
        let err = mapping::map_s3_error(StatusCode::NOT_FOUND, body, &mut ErrorContext::new());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_map_http_error_fallbacks() {
        let mut context = ErrorContext::for_service("other");

        let err = mapping::map_http_error(StatusCode::TOO_MANY_REQUESTS, "", &mut context);
        assert!(matches!(err, ServiceError::RateLimit(_)));

        let err = mapping::map_http_error(StatusCode::BAD_GATEWAY, "{\"message\":\"upstream down\"}", &mut context);
        assert_eq!(err.to_string(), "Service error: upstream down");

        let long_body = "x".repeat(300);
        let err = mapping::map_http_error(StatusCode::INTERNAL_SERVER_ERROR, &long_body, &mut context);
        assert!(err.to_string().ends_with("..."));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ServiceError = io.into();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
