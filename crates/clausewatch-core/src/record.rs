//! Risk records and the analysis response contract.

use serde::{Deserialize, Serialize};

use crate::catalog::Severity;
use crate::detector::PatternMatch;

/// How a record's explanation was produced and whether it can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    /// Built from static catalog text. No model involved.
    RuleOnly,
    /// Model explanation confirmed by the independent validation call.
    Verified,
    /// Model explanation not confirmed. Shown as "verify manually".
    Unverified,
    /// The model calls for this clause failed.
    Failed,
    /// From the whole-document model summary, never validated.
    ModelOnly,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleOnly => "rule-only",
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Failed => "failed",
            Self::ModelOnly => "model-only",
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::RuleOnly | Self::Verified)
    }
}

/// One detected risk, the output unit of every analysis mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    /// Verbatim, trimmed source text (the synthetic clean record excepted).
    pub clause: String,
    pub label: String,
    pub risk_level: Severity,
    pub what_it_means: String,
    pub why_harmful: String,
    pub estimated_loss: String,
    pub safer_alternative: String,
    pub trusted: bool,
    pub status: RecordStatus,
    /// Full model explanation, warning-prefixed when untrusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// The model's dark-pattern label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_pattern: Option<String>,
    /// Trimmed raw validation reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
}

pub const CLEAN_LABEL: &str = "Clean";

impl RiskRecord {
    /// Record built from catalog text for a whole-document match.
    ///
    /// The loss estimate reads figures from the whole `document`, since clause
    /// splitting breaks amounts like `$49.99` and rates like `10.5%`.
    pub fn from_pattern(m: &PatternMatch, document: &str) -> Self {
        let pattern = m.pattern;
        Self {
            clause: m.clause.clone(),
            label: pattern.label.to_string(),
            risk_level: pattern.severity,
            what_it_means: pattern.what_it_means.to_string(),
            why_harmful: pattern.why_harmful.to_string(),
            estimated_loss: pattern.estimator.estimate(document),
            safer_alternative: pattern.safer_alternative.to_string(),
            trusted: true,
            status: RecordStatus::RuleOnly,
            analysis: None,
            dark_pattern: None,
            validation: None,
        }
    }

    /// The single record returned when nothing matched.
    pub fn clean() -> Self {
        Self {
            clause: "Great news! No major red flags detected in this text.".to_string(),
            label: CLEAN_LABEL.to_string(),
            risk_level: Severity::Low,
            what_it_means: "The text you provided doesn't contain common predatory patterns."
                .to_string(),
            why_harmful: "Not applicable - this looks relatively safe.".to_string(),
            estimated_loss: "₹0 - No hidden costs detected.".to_string(),
            safer_alternative: "Keep reading carefully and watch for any unclear terms."
                .to_string(),
            trusted: true,
            status: RecordStatus::RuleOnly,
            analysis: None,
            dark_pattern: None,
            validation: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.label == CLEAN_LABEL
    }
}

/// Which path produced a response, when it was not the default model path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    RegexOnly,
    ModelSummary,
}

/// `{success, results, source?, warning?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub results: Vec<RiskRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl AnalysisResponse {
    pub fn new(results: Vec<RiskRecord>, source: Option<Source>) -> Self {
        Self {
            success: true,
            results,
            source,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Records that must be shown as "verify manually".
    pub fn untrusted_count(&self) -> usize {
        self.results.iter().filter(|r| !r.trusted).count()
    }
}

/// `{success: false, error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
