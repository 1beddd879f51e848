//! The hosted-model collaborator seen by the pipeline.

use async_trait::async_trait;
use thiserror::Error;

/// A stateless single-turn generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
}

impl GenerateRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("reasoning service not configured")]
    NotConfigured,
    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),
    #[error("reasoning service quota exceeded")]
    QuotaExceeded,
    #[error("reasoning service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[cfg(feature = "groq")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed reasoning response: {0}")]
    Malformed(String),
}

impl ReasoningError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

/// Sends one prompt to a hosted model and returns its raw reply text.
///
/// Timeouts and cancellation belong to the implementation. Replies are not
/// trusted: callers parse them with the fail-closed parsers in
/// [`reply`](crate::reply).
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ReasoningError>;
}
