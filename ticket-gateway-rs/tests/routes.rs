use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use config_rs::GatewaySettings;
use ticket_engine::{AssigneeSelector, EngineConfig, SeededRandom, TicketOrchestrator, TicketRecord};
use ticket_gateway::report_form::PLACEHOLDER_IMAGE_URL;
use ticket_gateway::{ErrorResponse, HealthResponse, TicketGateway};
use ticket_sdk::{
    CreatedIssue, FileTicketStore, FlattenedTicket, NewIssue, ObjectStorage, ServiceClient, ServiceError,
    TicketStore, TicketSystem,
};

const BOUNDARY: &str = "X-REPORT-BOUNDARY";

#[derive(Default)]
struct FakeJira {
    fail_create: bool,
    delay: Option<Duration>,
    issues: Mutex<Vec<NewIssue>>,
    comments: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl TicketSystem for FakeJira {
    async fn lookup_issue_type_id(&self, _project: &str, _name: &str) -> ticket_sdk::Result<Option<String>> {
        Ok(Some("10004".to_string()))
    }

    async fn create_issue(&self, issue: &NewIssue) -> ticket_sdk::Result<CreatedIssue> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create {
            return Err(ServiceError::service("Jira is down"));
        }

        let mut issues = self.issues.lock().unwrap();
        issues.push(issue.clone());
        let key = format!("SUP-{}", issues.len());
        Ok(CreatedIssue {
            link: format!("https://acme.atlassian.net/browse/{}", key),
            key,
        })
    }

    async fn add_comment(&self, ticket_id: &str, body: &str) -> ticket_sdk::Result<()> {
        self.comments.lock().unwrap().push((ticket_id.to_string(), body.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ServiceClient for FakeJira {
    fn name(&self) -> &str {
        "jira"
    }

    fn base_url(&self) -> &str {
        "https://acme.atlassian.net"
    }

    async fn health_check(&self) -> ticket_sdk::Result<bool> {
        Ok(true)
    }
}

#[derive(Default)]
struct FakeStorage {
    fail: bool,
    uploads: Mutex<Vec<(usize, String, String)>>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, file_name: &str) -> ticket_sdk::Result<String> {
        if self.fail {
            return Err(ServiceError::authorization("AccessDenied"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bytes.len(), content_type.to_string(), file_name.to_string()));
        Ok("https://screens.s3.us-east-1.amazonaws.com/uploads/reports/shot.png?X-Amz-Signature=abc".to_string())
    }
}

struct Harness {
    jira: Arc<FakeJira>,
    storage: Option<Arc<FakeStorage>>,
    store: Option<Arc<FileTicketStore>>,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::build(FakeJira::default(), Some(FakeStorage::default()), true)
    }

    fn build(jira: FakeJira, storage: Option<FakeStorage>, with_store: bool) -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            jira: Arc::new(jira),
            storage: storage.map(Arc::new),
            store: with_store.then(|| Arc::new(FileTicketStore::at(dir.path().join("tickets.ndjson")))),
            _dir: dir,
        }
    }

    fn router(&self) -> Router {
        self.router_with(&GatewaySettings::from_lookup(|_| None).unwrap())
    }

    fn router_with(&self, settings: &GatewaySettings) -> Router {
        let mut orchestrator = TicketOrchestrator::new(
            EngineConfig::new("SUP"),
            self.jira.clone() as Arc<dyn TicketSystem>,
            AssigneeSelector::new(vec!["acct-1".to_string()], Arc::new(SeededRandom::new(3))),
        );
        if let Some(store) = &self.store {
            orchestrator = orchestrator.with_store(store.clone() as Arc<dyn TicketStore>);
        }

        let mut gateway =
            TicketGateway::new(Arc::new(orchestrator)).with_jira_probe(self.jira.clone() as Arc<dyn ServiceClient>);
        if let Some(storage) = &self.storage {
            gateway = gateway.with_storage(storage.clone() as Arc<dyn ObjectStorage>);
        }

        Arc::new(gateway).create_router(settings)
    }
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_request(fields: &[(&str, &str)], image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image0\"; filename=\"shot.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/report-issue")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn report() -> Value {
    json!({
        "url": "https://app.example.com/checkout",
        "payload": {
            "issue": "Checkout broken",
            "description": "Pay button spins",
            "userEmail": "a@b.io"
        },
        "response": {"status": 500},
        "requestHeaders": {"Authorization": "Bearer secret-token"}
    })
}

const REPORT_FIELDS: &[(&str, &str)] = &[
    ("issue", "Checkout broken"),
    ("description", "Pay button spins"),
    ("userEmail", "a@b.io"),
    ("leadId", "42"),
    ("product", "checkout"),
    ("failedNetworkCalls", r#"[{"requestData":{"method":"POST","url":"https://api.example.com/pay"},"responseStatus":502}]"#),
    ("pageUrl", "https://app.example.com/checkout"),
];

#[tokio::test]
async fn create_ticket_returns_created_record() {
    let harness = Harness::new();

    let response = harness
        .router()
        .oneshot(json_request("/create-ticket", report()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record: TicketRecord = read_json(response).await;
    assert_eq!(record.ticket_id, "SUP-1");
    assert_eq!(record.status, "created");
    assert_eq!(record.assigned_to, "acct-1");
    assert_eq!(record.jira_link, "https://acme.atlassian.net/browse/SUP-1");

    let issues = harness.jira.issues.lock().unwrap();
    assert_eq!(issues[0].summary, "Issue Report: Checkout broken");
    assert_eq!(issues[0].issue_type_id, "10004");
}

#[tokio::test]
async fn create_ticket_rejects_malformed_json() {
    let harness = Harness::new();

    let request = Request::builder()
        .method("POST")
        .uri("/create-ticket")
        .header("content-type", "application/json")
        .body(Body::from("{\"url\": "))
        .unwrap();
    let response = harness.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "Invalid request body");
    assert!(body.details.is_some());
    assert!(harness.jira.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_ticket_requires_url_and_issue() {
    let harness = Harness::new();

    let mut no_url = report();
    no_url["url"] = json!("");
    let response = harness.router().oneshot(json_request("/create-ticket", no_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "Validation failed");

    let mut no_issue = report();
    no_issue["payload"] = json!({"description": "no title"});
    let response = harness.router().oneshot(json_request("/create-ticket", no_issue)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(harness.jira.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn submission_failure_is_a_server_error() {
    let harness = Harness::build(
        FakeJira {
            fail_create: true,
            ..FakeJira::default()
        },
        None,
        true,
    );

    let response = harness.router().oneshot(json_request("/create-ticket", report())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "Failed to create ticket");
    assert!(body.details.unwrap().contains("Jira is down"));
}

#[tokio::test(start_paused = true)]
async fn slow_ticket_system_hits_the_request_deadline() {
    let harness = Harness::build(
        FakeJira {
            delay: Some(Duration::from_secs(60)),
            ..FakeJira::default()
        },
        None,
        false,
    );
    let settings =
        GatewaySettings::from_lookup(|key| (key == "REQUEST_TIMEOUT_SECS").then(|| "2".to_string())).unwrap();

    let response = harness
        .router_with(&settings)
        .oneshot(json_request("/create-ticket", report()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(harness.jira.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_report_still_creates_a_ticket_with_overflow_comment() {
    let harness = Harness::new();
    let mut big = report();
    big["response"] = json!({"body": "r".repeat(60_000)});

    let response = harness.router().oneshot(json_request("/create-ticket", big)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let issues = harness.jira.issues.lock().unwrap();
    assert!(issues[0].description.chars().count() <= 32_000);

    let comments = harness.jira.comments.lock().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, "SUP-1");
    assert!(comments[0].1.contains("h3. Complete Response"));
}

#[tokio::test]
async fn create_ticket_shows_network_calls_text_as_sent() {
    let harness = Harness::new();
    let calls = r#"[{"requestData":{"method":"POST","url":"https://api.example.com/pay"},"responseStatus":502,"durationMs":900}]"#;
    let mut body = report();
    body["payload"]["failedNetworkCalls"] = json!(calls);

    let response = harness.router().oneshot(json_request("/create-ticket", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = harness.store.as_ref().unwrap().find_by_ticket_id("SUP-1").await.unwrap();
    assert!(!stored.payload_json.contains("rawNetworkCallsJSON"));
    assert!(stored.failed_network_calls_json.contains("\"responseStatus\":502"));

    let issues = harness.jira.issues.lock().unwrap();
    assert!(issues[0].description.contains(&format!("{{code:json}}\n{}\n{{code}}", calls)));
}

#[tokio::test]
async fn created_tickets_can_be_listed_and_fetched() {
    let harness = Harness::new();
    let router = harness.router();

    let response = router.clone().oneshot(json_request("/create-ticket", report())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router.clone().oneshot(get("/tickets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tickets: Vec<FlattenedTicket> = read_json(response).await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].issue, "Checkout broken");
    assert_eq!(tickets[0].page_url, "https://app.example.com/checkout");

    let response = router.clone().oneshot(get("/tickets/SUP-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ticket: FlattenedTicket = read_json(response).await;
    assert_eq!(ticket.ticket_id, "SUP-1");
    assert_eq!(ticket.user_email, "a@b.io");

    let response = router.oneshot(get("/tickets/SUP-999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "Ticket not found");
}

#[tokio::test]
async fn ticket_routes_need_a_store() {
    let harness = Harness::build(FakeJira::default(), None, false);

    for uri in ["/tickets", "/tickets/SUP-1"] {
        let response = harness.router().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "Database not available");
    }
}

#[tokio::test]
async fn report_issue_uploads_screenshot_and_files_ticket() {
    let harness = Harness::new();

    let response = harness
        .router()
        .oneshot(multipart_request(REPORT_FIELDS, Some(&b"\x89PNG fake image"[..])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record: TicketRecord = read_json(response).await;
    assert_eq!(record.ticket_id, "SUP-1");

    let stored = harness.store.as_ref().unwrap().find_by_ticket_id("SUP-1").await.unwrap();
    assert!(stored.image_url.starts_with("https://screens.s3"));
    assert_eq!(stored.product, "checkout");

    let uploads = harness.storage.as_ref().unwrap().uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, "image/png");
    assert_eq!(uploads[0].2, "shot.png");

    let issues = harness.jira.issues.lock().unwrap();
    let description = &issues[0].description;
    assert!(description.contains("!https://screens.s3.us-east-1.amazonaws.com/uploads/reports/shot.png"));
    assert!(description.contains("https://api.example.com/pay"));
    assert!(description.contains("* *Lead ID:* 42"));
    assert!(description.contains("\"status\": \"reported\""));
}

#[tokio::test]
async fn report_issue_without_storage_uses_placeholder_image() {
    let harness = Harness::build(FakeJira::default(), None, true);

    let response = harness
        .router()
        .oneshot(multipart_request(REPORT_FIELDS, Some(&b"png"[..])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let issues = harness.jira.issues.lock().unwrap();
    assert!(issues[0].description.contains(PLACEHOLDER_IMAGE_URL));
}

#[tokio::test]
async fn failed_upload_files_ticket_without_image() {
    let harness = Harness::build(
        FakeJira::default(),
        Some(FakeStorage {
            fail: true,
            ..FakeStorage::default()
        }),
        true,
    );

    let mut fields = REPORT_FIELDS.to_vec();
    fields.push(("imageS3URL", "https://cdn.example.com/client-shot.png"));

    let response = harness
        .router()
        .oneshot(multipart_request(&fields, Some(&b"png"[..])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let issues = harness.jira.issues.lock().unwrap();
    assert!(!issues[0].description.contains("h3. Screenshot"));
    assert!(!issues[0].description.contains("client-shot.png|width"));
}

#[tokio::test]
async fn report_issue_without_file_uses_client_image_link() {
    let harness = Harness::new();
    let mut fields = REPORT_FIELDS.to_vec();
    fields.push(("imageS3URL", "https://cdn.example.com/client-shot.png"));

    let response = harness.router().oneshot(multipart_request(&fields, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let issues = harness.jira.issues.lock().unwrap();
    assert!(issues[0].description.contains("!https://cdn.example.com/client-shot.png|width=800!"));
}

#[tokio::test]
async fn report_issue_requires_issue_and_description() {
    let harness = Harness::new();

    let response = harness
        .router()
        .oneshot(multipart_request(&[("issue", "Checkout broken")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.details.as_deref(), Some("Missing required field: description"));
    assert!(harness.jira.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn report_issue_keeps_unparseable_network_calls() {
    let harness = Harness::new();
    let fields = [
        ("issue", "Checkout broken"),
        ("description", "Pay button spins"),
        ("failedNetworkCalls", "not json at all"),
        ("pageUrl", "https://app.example.com/checkout"),
    ];

    let response = harness.router().oneshot(multipart_request(&fields, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = harness.store.as_ref().unwrap().find_by_ticket_id("SUP-1").await.unwrap();
    assert!(stored.payload_json.contains("not json at all"));
}

#[tokio::test]
async fn health_reports_each_collaborator() {
    let harness = Harness::build(FakeJira::default(), None, true);

    let response = harness.router().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = read_json(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.services["jira"], "ok");
    assert_eq!(health.services["storage"], "not configured");
    assert_eq!(health.services["database"], "ok");
    assert!(health.timestamp > 0);
}

#[tokio::test]
async fn root_lists_endpoints() {
    let harness = Harness::new();

    let response = harness.router().oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let banner: Value = read_json(response).await;
    assert_eq!(banner["service"], "ticket-gateway");
    assert!(banner["endpoints"]
        .as_array()
        .unwrap()
        .contains(&json!("POST /create-ticket")));
}
