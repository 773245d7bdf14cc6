// Advisory service trait - External analysis of the current telemetry
use crate::domain::advisory::{AdvisoryRequest, AdvisoryResult};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory transport failed: {0}")]
    Transport(String),

    #[error("advisory service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisory service returned no content")]
    EmptyResponse,

    #[error("advisory response was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("advisory response is missing a status summary")]
    MissingSummary,
}

#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Ask the service to analyze one telemetry request.
    async fn analyze(&self, request: &AdvisoryRequest) -> Result<AdvisoryResult, AdvisoryError>;
}
