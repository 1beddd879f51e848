//! Clause risk pipeline.
//!
//! Without a reasoner the pipeline is rule-only: the whole document is matched
//! against the pattern catalog and every record is built from static text.
//! With a reasoner each pre-filtered clause goes through explain + loss
//! (concurrently), then an independent validation call decides whether the
//! explanation is trusted. A failing clause degrades only its own record,
//! unless the service is unreachable for every clause, in which case the
//! response falls back to the rule-only scan.

use std::sync::Arc;

use clausewatch_core::{
    AnalysisResponse, FlaggedClause, RecordStatus, RiskRecord, Severity, Source, detect_all,
    flag_clauses,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::prompts::{explanation_request, loss_request, summary_request, validation_request};
use crate::reasoner::{Reasoner, ReasoningError};
use crate::reply::{Explanation, LossReply, ModelRisk, Verdict, parse_summary};

/// Prefix on every explanation the validator did not confirm.
pub const UNTRUSTED_WARNING: &str = "Not confident — please verify manually.";
pub const FAILED_ANALYSIS: &str = "AI Analysis Failed for this clause.";
pub const UNKNOWN_LOSS: &str = "Unknown";
pub const QUOTA_HINT: &str = "Reasoning service quota exceeded. Please try again later.";
pub const UNAVAILABLE_HINT: &str = "Reasoning service unavailable. Showing rule-based analysis.";

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Cap on clauses analysed at once. `None` runs every flagged clause together.
    pub max_concurrency: Option<usize>,
}

pub struct RiskPipeline {
    reasoner: Option<Arc<dyn Reasoner>>,
    config: PipelineConfig,
}

impl RiskPipeline {
    /// A pipeline that never calls an external service.
    pub fn rule_only() -> Self {
        Self {
            reasoner: None,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_reasoner(reasoner: Arc<dyn Reasoner>) -> Self {
        Self {
            reasoner: Some(reasoner),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn has_reasoner(&self) -> bool {
        self.reasoner.is_some()
    }

    // ── Mode A ──

    /// Rule-only whole-document analysis. Deterministic and never empty.
    pub fn scan_rules(&self, text: &str) -> AnalysisResponse {
        let mut results: Vec<RiskRecord> = detect_all(text)
            .iter()
            .map(|m| RiskRecord::from_pattern(m, text))
            .collect();
        info!(patterns = results.len(), "rule-only scan complete");
        if results.is_empty() {
            results.push(RiskRecord::clean());
        }
        AnalysisResponse::new(results, Some(Source::RegexOnly))
    }

    /// Per-clause model analysis when a reasoner is configured, otherwise
    /// the rule-only scan.
    pub async fn analyze(&self, text: &str) -> AnalysisResponse {
        match &self.reasoner {
            Some(reasoner) => self.analyze_clauses(reasoner.as_ref(), text).await,
            None => self.scan_rules(text),
        }
    }

    // ── Mode B ──

    async fn analyze_clauses(&self, reasoner: &dyn Reasoner, text: &str) -> AnalysisResponse {
        let flagged = flag_clauses(text);
        if flagged.is_empty() {
            info!("no clauses flagged");
            return AnalysisResponse::new(Vec::new(), None);
        }

        let limit = self.config.max_concurrency.unwrap_or(flagged.len()).max(1);
        info!(clauses = flagged.len(), limit, "analyzing flagged clauses");

        // `buffered` keeps output in detection order.
        let outcomes: Vec<Result<RiskRecord, ReasoningError>> =
            stream::iter(flagged.iter().map(|f| analyze_clause(reasoner, f)))
                .buffered(limit)
                .collect()
                .await;

        if outcomes
            .iter()
            .all(|outcome| matches!(outcome, Err(ReasoningError::Unavailable(_))))
        {
            warn!(clauses = flagged.len(), "reasoning service unreachable, falling back to rule-only scan");
            return self.scan_rules(text).with_warning(UNAVAILABLE_HINT);
        }

        let mut quota_hit = false;
        let results: Vec<RiskRecord> = flagged
            .iter()
            .zip(outcomes)
            .map(|(f, outcome)| match outcome {
                Ok(record) => record,
                Err(e) => {
                    quota_hit |= e.is_quota();
                    warn!(clause = f.clause.index, error = %e, "clause analysis failed");
                    failed_record(f)
                }
            })
            .collect();

        let untrusted = results.iter().filter(|r| !r.trusted).count();
        info!(records = results.len(), untrusted, "clause analysis complete");

        let response = AnalysisResponse::new(results, None);
        if quota_hit {
            response.with_warning(QUOTA_HINT)
        } else {
            response
        }
    }

    // ── Whole-document summary ──

    /// One model call over the whole document, answered as a JSON array.
    ///
    /// Entries whose clause does not occur verbatim in `text` are dropped.
    /// Records are never validated and carry status `model-only`.
    pub async fn summarize(&self, text: &str) -> Result<AnalysisResponse, AnalysisError> {
        let Some(reasoner) = &self.reasoner else {
            return Ok(self.scan_rules(text));
        };

        let request = summary_request(text);
        debug!(prompt_len = request.user_prompt.len(), "requesting document summary");
        let reply = reasoner.generate(&request).await?;
        let risks = parse_summary(&reply)?;

        let total = risks.len();
        let mut results: Vec<RiskRecord> =
            risks.into_iter().filter_map(|risk| summary_record(text, risk)).collect();
        if results.len() < total {
            warn!(dropped = total - results.len(), "dropped model records not found in document");
        }
        info!(records = results.len(), "document summary complete");

        if results.is_empty() {
            results.push(RiskRecord::clean());
        }
        Ok(AnalysisResponse::new(results, Some(Source::ModelSummary)))
    }
}

async fn analyze_clause(
    reasoner: &dyn Reasoner,
    flagged: &FlaggedClause,
) -> Result<RiskRecord, ReasoningError> {
    let clause = flagged.clause.as_str();
    let explain = explanation_request(clause);
    let loss = loss_request(clause);
    debug!(clause = flagged.clause.index, prompt_len = explain.user_prompt.len(), "explaining clause");

    let (explanation, loss) =
        futures::try_join!(reasoner.generate(&explain), reasoner.generate(&loss))?;
    let validation = reasoner
        .generate(&validation_request(clause, &explanation))
        .await?;

    Ok(model_record(flagged, &explanation, &loss, &validation))
}

fn model_record(
    flagged: &FlaggedClause,
    explanation: &str,
    loss: &str,
    validation: &str,
) -> RiskRecord {
    let verdict = Verdict::from_reply(validation);
    let parsed = match Explanation::parse(explanation) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(clause = flagged.clause.index, error = %e, "explanation did not parse");
            None
        }
    };
    let trusted = verdict.is_trusted() && parsed.is_some();

    let analysis = if trusted {
        explanation.to_string()
    } else {
        format!("{UNTRUSTED_WARNING}\n\n{explanation}")
    };

    let (what_it_means, why_harmful, safer_alternative, dark_pattern) = match parsed {
        Some(e) => (e.risk_highlight, e.why_risky, e.safer_rewrite, Some(e.dark_pattern)),
        None => (explanation.trim().to_string(), String::new(), String::new(), None),
    };

    RiskRecord {
        clause: flagged.clause.text.clone(),
        label: flagged.rule.label.to_string(),
        risk_level: flagged.rule.severity,
        what_it_means,
        why_harmful,
        estimated_loss: LossReply::parse(loss).to_string(),
        safer_alternative,
        trusted,
        status: if trusted {
            RecordStatus::Verified
        } else {
            RecordStatus::Unverified
        },
        analysis: Some(analysis),
        dark_pattern,
        validation: Some(validation.trim().to_string()),
    }
}

fn failed_record(flagged: &FlaggedClause) -> RiskRecord {
    RiskRecord {
        clause: flagged.clause.text.clone(),
        label: flagged.rule.label.to_string(),
        risk_level: flagged.rule.severity,
        what_it_means: FAILED_ANALYSIS.to_string(),
        why_harmful: String::new(),
        estimated_loss: UNKNOWN_LOSS.to_string(),
        safer_alternative: String::new(),
        trusted: false,
        status: RecordStatus::Failed,
        analysis: Some(FAILED_ANALYSIS.to_string()),
        dark_pattern: None,
        validation: None,
    }
}

fn summary_record(document: &str, risk: ModelRisk) -> Option<RiskRecord> {
    let clause = risk.clause.trim();
    let label = risk.label.trim();
    if clause.is_empty() || label.is_empty() || !document.contains(clause) {
        debug!(clause, "skipping model record");
        return None;
    }

    Some(RiskRecord {
        clause: clause.to_string(),
        label: label.to_string(),
        risk_level: Severity::parse(&risk.risk_level).unwrap_or(Severity::Medium),
        what_it_means: risk.what_it_means,
        why_harmful: risk.why_harmful,
        estimated_loss: risk.real_example,
        safer_alternative: risk.safer_alternative,
        trusted: false,
        status: RecordStatus::ModelOnly,
        analysis: None,
        dark_pattern: None,
        validation: None,
    })
}
