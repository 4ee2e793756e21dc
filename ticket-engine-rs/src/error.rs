//! Error types for the ticket engine

use thiserror::Error;
use ticket_sdk::ServiceError;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The report cannot become a ticket
    #[error("invalid report: {0}")]
    Validation(String),

    /// The ticket system refused or never answered; no ticket exists
    #[error("failed to create ticket: {0}")]
    Submission(#[source] ServiceError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}
