//! Reasoning layer: hosted-model prompts, fail-closed reply parsing, and the
//! clause risk pipeline that falls back to rule-only analysis.

mod error;
pub mod pipeline;
pub mod prompts;
pub mod reasoner;
pub mod reply;

#[cfg(feature = "groq")]
pub mod groq;

pub use error::AnalysisError;
pub use pipeline::{PipelineConfig, RiskPipeline};
pub use reasoner::{GenerateRequest, Reasoner, ReasoningError};

#[cfg(feature = "groq")]
pub use groq::{GroqClient, GroqConfig};
