//! Ticket engine
//!
//! Turns large, loosely structured diagnostic reports into a Jira ticket
//! description that never exceeds the upstream size ceiling. Whatever does not
//! fit is kept in an overflow document that is posted as a comment.
//!
//! Pipeline, per report:
//! normalize → parse network calls → allocate budget → render sections →
//! assemble → final guard → pick assignee → submit → comment → persist.
//!
//! The ticket system and ticket store are reached through the traits in
//! `ticket_sdk::core`, so the whole pipeline runs against in-memory fakes in
//! tests.

pub mod assignee;
pub mod budget;
pub mod document;
pub mod error;
pub mod markup;
pub mod model;
pub mod network_calls;
pub mod normalizer;
pub mod orchestrator;
pub mod overflow;
pub mod section;


pub use assignee::{AssigneeSelector, RandomSource, SeededRandom, ThreadRandom};
pub use budget::{Budget, CEILING};
pub use error::{EngineError, Result};
pub use model::{DiagnosticReport, TicketRecord};
pub use network_calls::{parse_network_calls, NetworkCall, NetworkCallParser, ParseOutcome};
pub use orchestrator::{ComposedTicket, EngineConfig, TicketOrchestrator};
pub use overflow::OverflowDocument;
