use thiserror::Error;

use crate::reasoner::ReasoningError;
use crate::reply::ReplyError;

/// Failure of a whole-document analysis path. Per-clause analysis never
/// returns this: its failures degrade individual records instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),

    #[error("malformed model output: {0}")]
    MalformedModelOutput(#[from] ReplyError),
}

impl AnalysisError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Reasoning(e) if e.is_quota())
    }
}
