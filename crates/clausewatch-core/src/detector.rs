//! Rule-based risk detection.
//!
//! Two operations with different cardinality:
//!
//! - [`detect`] tests one clause against the ordered [`ClauseRule`] list and
//!   reports only the first matching rule. [`flag_clauses`] applies it to every
//!   clause of a document and is the pre-filter in front of model analysis.
//! - [`detect_all`] scans a whole document against the explanatory
//!   [`CATALOG`] and reports every pattern whose keywords occur anywhere.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::{CATALOG, RiskPattern, Severity};
use crate::clause::{Clause, split_clauses};

/// A per-clause detection rule.
#[derive(Debug)]
pub struct ClauseRule {
    pub label: &'static str,
    pub severity: Severity,
    pub pattern: Regex,
}

impl ClauseRule {
    fn new(pattern: &str, label: &'static str, severity: Severity) -> Self {
        Self {
            label,
            severity,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("clause rule pattern is valid"),
        }
    }

    pub fn matches(&self, clause: &str) -> bool {
        self.pattern.is_match(clause)
    }
}

// Order is the tie-break: the first matching rule labels the clause.
static RULES: Lazy<Vec<ClauseRule>> = Lazy::new(|| {
    use Severity::*;
    vec![
        ClauseRule::new(r"auto-?renew|renew automatically", "Auto Renewal", High),
        ClauseRule::new(
            r"without prior notice|without notification|without prior intimation|sole discretion|reserves the right to modify",
            "Forced Consent",
            Medium,
        ),
        ClauseRule::new(r"processing fee|service charge|maintenance fee", "Hidden Fee", High),
        ClauseRule::new(r"non-?refundable|no refund", "No Refund", Medium),
        ClauseRule::new(r"late fee|delay charge|penalty", "Penalty", High),
        ClauseRule::new(
            r"variable interest|interest may increase|dynamic interest|modify the annual percentage rate|modify the apr",
            "Variable Interest",
            High,
        ),
        ClauseRule::new(r"cancellation fee|termination fee", "Cancellation Fee", Medium),
        ClauseRule::new(r"hidden charges|additional charges may apply", "Hidden Charges", High),
        ClauseRule::new(r"third[- ]party charges", "Third Party Charges", Medium),
        ClauseRule::new(r"minimum balance|minimum amount required", "Minimum Balance", Low),
        ClauseRule::new(r"convenience fee", "Convenience Fee", Low),
        ClauseRule::new(r"lock-in period", "Lock-in Period", Medium),
        ClauseRule::new(r"pre-?closure charge|foreclosure fee", "Pre-closure Charge", Medium),
        ClauseRule::new(
            r"share.*data|third-?party marketing|sell.*data|share.*credit history|irrevocable.*license",
            "Data Privacy",
            High,
        ),
    ]
});

/// The ordered per-clause rule list.
pub fn rules() -> &'static [ClauseRule] {
    &RULES
}

/// First rule matching `clause`, in declaration order.
pub fn detect(clause: &str) -> Option<&'static ClauseRule> {
    rules().iter().find(|rule| rule.matches(clause))
}

/// A clause tagged by the per-clause pre-filter.
#[derive(Debug, Clone)]
pub struct FlaggedClause {
    pub clause: Clause,
    pub rule: &'static ClauseRule,
}

/// Split `text` and keep the clauses some rule matches, in document order.
pub fn flag_clauses(text: &str) -> Vec<FlaggedClause> {
    let flagged: Vec<FlaggedClause> = split_clauses(text)
        .into_iter()
        .filter_map(|clause| detect(clause.as_str()).map(|rule| FlaggedClause { clause, rule }))
        .collect();
    debug!(count = flagged.len(), "flagged clauses");
    flagged
}

/// A catalog pattern found somewhere in a document.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub pattern: &'static RiskPattern,
    /// Keywords of the pattern present in the document, in keyword order.
    pub keywords: Vec<&'static str>,
    /// First clause (document order) containing one of `keywords`.
    pub clause: String,
}

/// Scan the whole document against the catalog; one match per pattern hit.
///
/// Patterns are independent: a clause that triggers two patterns yields two
/// matches.
pub fn detect_all(document: &str) -> Vec<PatternMatch> {
    // ASCII lowercasing keeps byte offsets aligned with `document`.
    let lower = document.to_ascii_lowercase();
    let clauses = split_clauses(document);

    CATALOG
        .iter()
        .filter_map(|pattern| {
            let keywords = pattern.found_keywords(&lower);
            let first = *keywords.first()?;
            let clause = matching_clause(&clauses, &keywords)
                .unwrap_or_else(|| keyword_span(document, &lower, first));
            Some(PatternMatch {
                pattern,
                keywords,
                clause,
            })
        })
        .collect()
}

fn matching_clause(clauses: &[Clause], keywords: &[&str]) -> Option<String> {
    clauses
        .iter()
        .find(|c| {
            let lower = c.text.to_ascii_lowercase();
            keywords.iter().any(|kw| lower.contains(kw))
        })
        .map(|c| c.text.clone())
}

/// Source text under the first occurrence of `keyword`.
fn keyword_span(document: &str, lower: &str, keyword: &str) -> String {
    lower
        .find(keyword)
        .and_then(|start| document.get(start..start + keyword.len()))
        .unwrap_or(keyword)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_fee_is_hidden_fee() {
        let rule = detect("There is a processing fee of $50 applied monthly").unwrap();
        assert_eq!(rule.label, "Hidden Fee");
        assert_eq!(rule.severity, Severity::High);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(detect("This plan will AUTO-RENEW yearly").unwrap().label, "Auto Renewal");
        assert_eq!(detect("Fees are NON-REFUNDABLE").unwrap().label, "No Refund");
    }

    #[test]
    fn first_declared_rule_wins() {
        // Matches both Auto Renewal and Penalty; Auto Renewal is declared first.
        let rule = detect("A late fee applies and the plan will auto-renew").unwrap();
        assert_eq!(rule.label, "Auto Renewal");
    }

    #[test]
    fn clean_clause_has_no_label() {
        assert!(detect("Payments are due on the first of each month").is_none());
    }

    #[test]
    fn flag_clauses_keeps_document_order() {
        let text = "Welcome to the bank.\n\
                    A late fee of $25 applies;\n\
                    Thank you!\n\
                    We may share your data with partners.";
        let flagged = flag_clauses(text);
        let summary: Vec<(usize, &str)> = flagged
            .iter()
            .map(|f| (f.clause.index, f.rule.label))
            .collect();
        assert_eq!(summary, vec![(1, "Penalty"), (3, "Data Privacy")]);
        assert_eq!(flagged[0].clause.text, "A late fee of $25 applies");
    }

    #[test]
    fn flag_clauses_empty_text() {
        assert!(flag_clauses("").is_empty());
    }

    #[test]
    fn detect_all_reports_every_pattern() {
        let text = "A processing fee of $50 applies. This plan will auto-renew every month.";
        let matches = detect_all(text);
        let labels: Vec<&str> = matches.iter().map(|m| m.pattern.label).collect();
        assert_eq!(labels, vec!["Hidden Fee", "Auto Renew"]);
        assert_eq!(matches[0].clause, "A processing fee of $50 applies");
        assert_eq!(matches[1].clause, "This plan will auto-renew every month");
    }

    #[test]
    fn detect_all_same_clause_two_patterns() {
        let text = "A late fee may change at any time";
        let matches = detect_all(text);
        let labels: Vec<&str> = matches.iter().map(|m| m.pattern.label).collect();
        assert_eq!(labels, vec!["Forced Consent", "Penalty Trap"]);
        assert!(matches.iter().all(|m| m.clause == text));
    }

    #[test]
    fn detect_all_collects_found_keywords() {
        let matches = detect_all("Late fee and PENALTY CHARGE apply.");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].keywords, vec!["late fee", "penalty", "penalty charge"]);
    }

    #[test]
    fn detect_all_clean_text() {
        assert!(detect_all("Payments are due on the first of each month.").is_empty());
    }

    #[test]
    fn keyword_span_is_verbatim() {
        let doc = "x HIDDEN FEE y";
        let lower = doc.to_ascii_lowercase();
        assert_eq!(keyword_span(doc, &lower, "hidden fee"), "HIDDEN FEE");
    }
}
