//! HTTP surface of the ticket service.
//!
//! Routes:
//! - `POST /create-ticket`: JSON diagnostic report
//! - `POST /report-issue`: multipart report with an optional screenshot
//! - `GET /tickets`, `GET /tickets/:id`: stored ticket projections
//! - `GET /health`, `GET /`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use config_rs::{AllowedOrigins, GatewaySettings};
use ticket_engine::{DiagnosticReport, EngineError, TicketOrchestrator};
use ticket_sdk::util::generate_request_id;
use ticket_sdk::{ObjectStorage, ServiceClient};

pub mod report_form;
pub mod validation;

use report_form::{ReportForm, Screenshot, PLACEHOLDER_IMAGE_URL};
use validation::{sanitize_report, validate_report, ApiValidationError};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub const SERVICE_NAME: &str = "ticket-gateway";

pub const HEALTH_OK: &str = "ok";
pub const HEALTH_DEGRADED: &str = "degraded";
pub const HEALTH_UNAVAILABLE: &str = "unavailable";
pub const HEALTH_NOT_CONFIGURED: &str = "not configured";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: BTreeMap<String, String>,
    pub timestamp: i64,
}

fn error_response(status: StatusCode, error: ErrorResponse) -> Response {
    (status, Json(error)).into_response()
}

fn engine_error_response(err: EngineError) -> Response {
    match err {
        EngineError::Validation(message) => {
            error_response(StatusCode::BAD_REQUEST, ErrorResponse::with_details("Validation failed", message))
        }
        EngineError::Submission(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::with_details("Failed to create ticket", e.to_string()),
        ),
    }
}

fn database_unavailable() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::with_details("Database not available", "Ticket store is not configured"),
    )
}

/// Core gateway state shared by every handler
pub struct TicketGateway {
    orchestrator: Arc<TicketOrchestrator>,
    storage: Option<Arc<dyn ObjectStorage>>,
    jira_probe: Option<Arc<dyn ServiceClient>>,
    storage_probe: Option<Arc<dyn ServiceClient>>,
}

impl TicketGateway {
    pub fn new(orchestrator: Arc<TicketOrchestrator>) -> Self {
        Self {
            orchestrator,
            storage: None,
            jira_probe: None,
            storage_probe: None,
        }
    }

    /// Upload screenshots from `/report-issue` into `storage`
    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Report `probe` as the `jira` entry of `/health`
    pub fn with_jira_probe(mut self, probe: Arc<dyn ServiceClient>) -> Self {
        self.jira_probe = Some(probe);
        self
    }

    /// Report `probe` as the `storage` entry of `/health`
    pub fn with_storage_probe(mut self, probe: Arc<dyn ServiceClient>) -> Self {
        self.storage_probe = Some(probe);
        self
    }

    /// Create the Axum router with all routes and middleware
    pub fn create_router(self: Arc<Self>, settings: &GatewaySettings) -> Router {
        let _ = *START_TIME;

        Router::new()
            .route("/", get(Self::root_handler))
            .route("/health", get(Self::health_handler))
            .route("/create-ticket", post(Self::create_ticket_handler))
            .route("/report-issue", post(Self::report_issue_handler))
            .route("/tickets", get(Self::list_tickets_handler))
            .route("/tickets/:id", get(Self::get_ticket_handler))
            .layer(TimeoutLayer::new(settings.request_timeout))
            .layer(middleware::from_fn(log_requests))
            .layer(DefaultBodyLimit::max(settings.max_body_bytes))
            .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
            .layer(cors_layer(&settings.allowed_origins))
            .with_state(self)
    }

    async fn root_handler() -> impl IntoResponse {
        Json(serde_json::json!({
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": START_TIME.elapsed().as_secs(),
            "endpoints": [
                "GET /health",
                "POST /create-ticket",
                "POST /report-issue",
                "GET /tickets",
                "GET /tickets/:id"
            ]
        }))
    }

    async fn health_handler(State(state): State<Arc<Self>>) -> impl IntoResponse {
        let jira = probe_status(state.jira_probe.as_deref()).await;
        let storage = probe_status(state.storage_probe.as_deref()).await;
        let database = if state.orchestrator.store().is_some() {
            HEALTH_OK
        } else {
            HEALTH_NOT_CONFIGURED
        };

        let status = if jira == HEALTH_OK { HEALTH_OK } else { HEALTH_DEGRADED };

        let services = BTreeMap::from([
            ("jira".to_string(), jira.to_string()),
            ("storage".to_string(), storage.to_string()),
            ("database".to_string(), database.to_string()),
        ]);

        Json(HealthResponse {
            status: status.to_string(),
            services,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    /// POST /create-ticket
    async fn create_ticket_handler(
        State(state): State<Arc<Self>>,
        body: Result<Json<DiagnosticReport>, JsonRejection>,
    ) -> Response {
        let mut report = match body {
            Ok(Json(report)) => report,
            Err(rejection) => {
                log::warn!("Rejected ticket request: {}", rejection.body_text());
                return ApiValidationError::from(rejection).into_response();
            }
        };

        if let Err(err) = validate_report(&report) {
            log::warn!("Ticket request failed validation: {}", err);
            return err.into_response();
        }
        sanitize_report(&mut report);

        let url = report.url.clone();
        match state.orchestrator.create_ticket(report).await {
            Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
            Err(err) => {
                log::error!("Failed to create ticket for {}: {}", url, err);
                engine_error_response(err)
            }
        }
    }

    /// POST /report-issue
    async fn report_issue_handler(State(state): State<Arc<Self>>, multipart: Multipart) -> Response {
        let mut form = match ReportForm::from_multipart(multipart).await {
            Ok(form) => form,
            Err(err) => {
                log::warn!("Failed to read report form: {}", err);
                return err.into_response();
            }
        };

        if let Err(err) = form.validate() {
            log::warn!("Report form failed validation: {}", err);
            return err.into_response();
        }

        let screenshot = match form.image.take() {
            Some(image) => state.store_screenshot(image).await,
            None => {
                log::info!("No screenshot uploaded with report");
                Screenshot::NotSent
            }
        };

        let mut report = form.into_report(screenshot);
        sanitize_report(&mut report);

        match state.orchestrator.create_ticket(report).await {
            Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
            Err(err) => {
                log::error!("Failed to create ticket from report: {}", err);
                engine_error_response(err)
            }
        }
    }

    async fn store_screenshot(&self, image: report_form::UploadedImage) -> Screenshot {
        let Some(storage) = &self.storage else {
            log::warn!("Object storage not configured, using placeholder image URL");
            return Screenshot::Stored(PLACEHOLDER_IMAGE_URL.to_string());
        };

        match storage.upload(image.bytes, &image.content_type, &image.file_name).await {
            Ok(url) => {
                log::info!("Screenshot uploaded: {}", ticket_sdk::util::preview(&url, 120));
                Screenshot::Stored(url)
            }
            Err(err) => {
                log::error!("Failed to upload screenshot: {}", err);
                Screenshot::Failed
            }
        }
    }

    /// GET /tickets
    async fn list_tickets_handler(State(state): State<Arc<Self>>) -> Response {
        let Some(store) = state.orchestrator.store() else {
            return database_unavailable();
        };

        match store.find_all().await {
            Ok(tickets) => Json(tickets).into_response(),
            Err(err) => {
                log::error!("Failed to retrieve tickets: {}", err);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to retrieve tickets", err.to_string()),
                )
            }
        }
    }

    /// GET /tickets/:id
    async fn get_ticket_handler(State(state): State<Arc<Self>>, Path(id): Path<String>) -> Response {
        if id.trim().is_empty() {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details("Invalid request", "Ticket ID is required"),
            );
        }

        let Some(store) = state.orchestrator.store() else {
            return database_unavailable();
        };

        match store.find_by_ticket_id(&id).await {
            Ok(ticket) => Json(ticket).into_response(),
            Err(err) if err.is_not_found() => error_response(
                StatusCode::NOT_FOUND,
                ErrorResponse::with_details("Ticket not found", format!("Ticket with ID {} not found", id)),
            ),
            Err(err) => {
                log::error!("Failed to retrieve ticket {}: {}", id, err);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to retrieve ticket", err.to_string()),
                )
            }
        }
    }
}

async fn probe_status(probe: Option<&dyn ServiceClient>) -> &'static str {
    let Some(probe) = probe else {
        return HEALTH_NOT_CONFIGURED;
    };

    match probe.health_check().await {
        Ok(true) => HEALTH_OK,
        Ok(false) => HEALTH_UNAVAILABLE,
        Err(err) => {
            log::warn!("Health check for {} failed: {}", probe.name(), err);
            HEALTH_UNAVAILABLE
        }
    }
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        log::warn!("Ignoring invalid CORS origin {:?}", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

/// Access log line per request
async fn log_requests(request: Request, next: Next) -> Response {
    let request_id = generate_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "[{}] {} {} -> {} ({} ms)",
        request_id,
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}
