use crate::domain::entities::turn::Turn;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    #[error("completion provider is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("provider returned an empty completion")]
    Empty,
}

/// Sampling parameters and the full message list for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Turn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// False when no usable credential is present. Callers must not call
    /// [`complete`](Self::complete) in that case.
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
