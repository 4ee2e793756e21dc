//! Turns a diagnostic report into a filed ticket.
//!
//! Composition (normalize, parse, budget, render, assemble, guard) is pure and
//! exposed separately from submission so it can be inspected without a
//! ticket system. Only the issue submission can fail a request; the overflow
//! comment and the persisted projection are best effort.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use ticket_sdk::util::{preview, sanitize_for_logging};
use ticket_sdk::{FlattenedTicket, NewIssue, TicketStore, TicketSystem};

use crate::assignee::AssigneeSelector;
use crate::budget::{Budget, CEILING};
use crate::document::{assemble, enforce_ceiling, EssentialContent};
use crate::error::{EngineError, Result};
use crate::model::{DiagnosticReport, TicketRecord, STATUS_CREATED};
use crate::network_calls::{interpret_network_calls, NetworkCallsContent, NETWORK_CALLS_KEY};
use crate::normalizer::{normalize, NormalizedFields};
use crate::overflow::OverflowDocument;
use crate::section::{render_content, render_section, RenderedSection, SectionKind};

pub const DEFAULT_ISSUE_TYPE: &str = "Bug";

/// Issue type id used when the project metadata has no usable answer
pub const FALLBACK_ISSUE_TYPE_ID: &str = "10001";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub project_key: String,
    pub ceiling: usize,
    pub issue_type_name: String,
    pub fallback_issue_type_id: String,
}

impl EngineConfig {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            ceiling: CEILING,
            issue_type_name: DEFAULT_ISSUE_TYPE.to_string(),
            fallback_issue_type_id: FALLBACK_ISSUE_TYPE_ID.to_string(),
        }
    }
}

/// Everything derived from a report before it is submitted.
#[derive(Debug, Clone)]
pub struct ComposedTicket {
    pub fields: NormalizedFields,
    pub summary: String,
    pub description: String,
    pub budget: Budget,
    pub sections: Vec<RenderedSection>,
    pub overflow: OverflowDocument,

    /// Structured reading of the network-calls field, for the projection
    pub network_calls: NetworkCallsContent,
}

pub struct TicketOrchestrator {
    config: EngineConfig,
    tickets: Arc<dyn TicketSystem>,
    store: Option<Arc<dyn TicketStore>>,
    assignees: AssigneeSelector,
}

impl TicketOrchestrator {
    pub fn new(config: EngineConfig, tickets: Arc<dyn TicketSystem>, assignees: AssigneeSelector) -> Self {
        Self {
            config,
            tickets,
            store: None,
            assignees,
        }
    }

    /// Persist a projection of every created ticket into `store`
    pub fn with_store(mut self, store: Arc<dyn TicketStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&Arc<dyn TicketStore>> {
        self.store.as_ref()
    }

    /// Build the description and overflow document for `report`
    pub fn compose(&self, report: &DiagnosticReport, created_at: DateTime<Utc>) -> ComposedTicket {
        let fields = normalize(report);
        let network_calls = interpret_network_calls(report.payload.get(NETWORK_CALLS_KEY));

        let essential = EssentialContent::new(&fields, created_at);
        let budget = Budget::allocate(self.config.ceiling, essential.length());
        debug!(
            essential = budget.essential_length,
            remaining = budget.remaining,
            "allocated section budget"
        );

        let mut overflow = OverflowDocument::new();
        let sections: Vec<RenderedSection> = SectionKind::ALL
            .iter()
            .map(|&kind| {
                let content = section_content(kind, report);
                render_section(kind, content, kind.allocation(&budget), &mut overflow)
            })
            .collect();

        let document = assemble(&essential, &sections);
        let description = enforce_ceiling(document, self.config.ceiling, &mut overflow);

        ComposedTicket {
            summary: format!("Issue Report: {}", fields.issue),
            fields,
            description,
            budget,
            sections,
            overflow,
            network_calls,
        }
    }

    /// File a ticket for `report`.
    ///
    /// Errors only when the report is invalid or the ticket system rejects
    /// the issue.
    #[instrument(skip_all, fields(project = %self.config.project_key))]
    pub async fn create_ticket(&self, report: DiagnosticReport) -> Result<TicketRecord> {
        validate(&report)?;

        let created_at = Utc::now();
        let composed = self.compose(&report, created_at);

        let assignee = self.assignees.select();
        let issue_type_id = self.resolve_issue_type().await;

        info!(
            summary = %composed.summary,
            issue_type_id = %issue_type_id,
            assignee = %assignee,
            length = composed.description.chars().count(),
            truncated = !composed.overflow.is_empty(),
            "submitting ticket"
        );
        debug!(description = %preview(&composed.description, 500), "ticket description");
        for (name, value) in &report.request_headers {
            debug!(header = %name, value = %sanitize_for_logging(value), "reported request header");
        }

        let created = self
            .tickets
            .create_issue(&NewIssue {
                project_key: self.config.project_key.clone(),
                issue_type_id,
                summary: composed.summary.clone(),
                description: composed.description.clone(),
                assignee: assignee.clone(),
            })
            .await
            .map_err(|e| {
                error!(error = %e, "ticket submission failed");
                EngineError::Submission(e)
            })?;

        info!(ticket_id = %created.key, link = %created.link, "ticket created");

        self.attach_overflow(&created.key, &composed.overflow).await;

        let record = TicketRecord {
            ticket_id: created.key,
            status: STATUS_CREATED.to_string(),
            assigned_to: assignee,
            jira_link: created.link,
        };

        self.persist(&record, &composed, &report, created_at).await;

        Ok(record)
    }

    async fn resolve_issue_type(&self) -> String {
        let lookup = self
            .tickets
            .lookup_issue_type_id(&self.config.project_key, &self.config.issue_type_name)
            .await;

        match lookup {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(
                    issue_type = %self.config.issue_type_name,
                    fallback = %self.config.fallback_issue_type_id,
                    "issue type not found in project metadata"
                );
                self.config.fallback_issue_type_id.clone()
            }
            Err(e) => {
                warn!(error = %e, fallback = %self.config.fallback_issue_type_id, "issue type lookup failed");
                self.config.fallback_issue_type_id.clone()
            }
        }
    }

    async fn attach_overflow(&self, ticket_id: &str, overflow: &OverflowDocument) {
        let Some(comment) = overflow.compose(self.config.ceiling) else {
            return;
        };

        match self.tickets.add_comment(ticket_id, &comment).await {
            Ok(()) => info!(ticket_id, blocks = overflow.blocks().len(), "attached overflow comment"),
            Err(e) => warn!(ticket_id, error = %e, "failed to attach overflow comment"),
        }
    }

    async fn persist(
        &self,
        record: &TicketRecord,
        composed: &ComposedTicket,
        report: &DiagnosticReport,
        created_at: DateTime<Utc>,
    ) {
        let Some(store) = &self.store else {
            warn!(ticket_id = %record.ticket_id, "no ticket store configured, skipping persistence");
            return;
        };

        let ticket = flatten(record, composed, report, created_at);
        match store.save(&ticket).await {
            Ok(id) => debug!(ticket_id = %record.ticket_id, id = %id, "ticket persisted"),
            Err(e) => error!(ticket_id = %record.ticket_id, error = %e, "failed to persist ticket"),
        }
    }
}

/// A ticket needs at least an issue title
pub fn validate(report: &DiagnosticReport) -> Result<()> {
    if normalize(report).issue.trim().is_empty() {
        return Err(EngineError::validation("issue is required"));
    }
    Ok(())
}

fn section_content(kind: SectionKind, report: &DiagnosticReport) -> Option<String> {
    match kind {
        SectionKind::NetworkCalls => match report.payload.get(NETWORK_CALLS_KEY) {
            None | Some(Value::Null) => None,
            // Shown exactly as reported so the overflow keeps the original text
            Some(Value::String(raw)) => (!raw.trim().is_empty()).then(|| raw.clone()),
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(value) => Some(render_content(value)),
        },
        SectionKind::RequestHeaders => {
            (!report.request_headers.is_empty()).then(|| render_content(&report.request_headers))
        }
        SectionKind::Response => (!report.response.is_empty()).then(|| render_content(&report.response)),
        SectionKind::Payload => (!report.payload.is_empty()).then(|| render_content(&report.payload)),
    }
}

/// Projection written to the ticket store
pub fn flatten(
    record: &TicketRecord,
    composed: &ComposedTicket,
    report: &DiagnosticReport,
    created_at: DateTime<Utc>,
) -> FlattenedTicket {
    let fields = &composed.fields;

    FlattenedTicket {
        id: String::new(),
        ticket_id: record.ticket_id.clone(),
        status: record.status.clone(),
        assigned_to: record.assigned_to.clone(),
        jira_link: record.jira_link.clone(),
        created_at,
        issue: fields.issue.clone(),
        description: fields.description.clone(),
        user_email: fields.user_email.clone(),
        lead_id: fields.lead_id.clone(),
        product: fields.product.clone(),
        page_url: fields.page_url.clone(),
        image_url: fields.image_reference.clone().unwrap_or_default(),
        failed_network_calls_json: serde_json::to_string(&composed.network_calls.to_value()).unwrap_or_default(),
        payload_json: serde_json::to_string(&report.payload).unwrap_or_default(),
        response_json: serde_json::to_string(&report.response).unwrap_or_default(),
        request_headers_json: serde_json::to_string(&report.request_headers).unwrap_or_default(),
    }
}
