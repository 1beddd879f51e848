//! Fail-closed parsers for raw model replies.
//!
//! Nothing the model returns is trusted as-is. Each parser either produces a
//! typed value or falls back to the conservative reading: an explanation that
//! does not carry all five fields is an error, a loss figure that is not a
//! plain rupee amount is `Unknown`, and a validation reply that does not
//! clearly say `Correct` is not a confirmation.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("empty reply")]
    Empty,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Explanation ──

const FIELD_KEYS: [&str; 5] = [
    "risk highlight",
    "why it is risky",
    "estimated possible loss",
    "safer rewrite suggestion",
    "dark pattern label",
];

const FIELD_NAMES: [&str; 5] = [
    "Risk Highlight",
    "Why it is risky",
    "Estimated possible loss",
    "Safer rewrite suggestion",
    "Dark pattern label",
];

/// The five labelled fields of a clause explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub risk_highlight: String,
    pub why_risky: String,
    pub estimated_loss: String,
    pub safer_rewrite: String,
    pub dark_pattern: String,
}

impl Explanation {
    /// Parse a labelled reply. Every field must be present and non-empty.
    ///
    /// Tolerates markdown decoration around labels (`**Risk Highlight:**`,
    /// `- Safer rewrite suggestion:`) and values continued on following lines.
    pub fn parse(reply: &str) -> Result<Self, ReplyError> {
        if reply.trim().is_empty() {
            return Err(ReplyError::Empty);
        }

        let mut values: [Option<String>; 5] = Default::default();
        let mut current: Option<usize> = None;

        for line in reply.lines() {
            let stripped =
                line.trim_start_matches(|c: char| matches!(c, '*' | '#' | '-' | '>') || c.is_whitespace());
            let lower = stripped.to_ascii_lowercase();

            if let Some(idx) = FIELD_KEYS.iter().position(|key| lower.starts_with(key)) {
                // Skip a parenthetical hint after the label; it may hold colons.
                let mut rest = &stripped[FIELD_KEYS[idx].len()..];
                if rest.trim_start().starts_with('(') {
                    if let Some(close) = rest.find(')') {
                        rest = &rest[close + 1..];
                    }
                }
                let value = rest.split_once(':').map(|(_, v)| v).unwrap_or("");
                values[idx] = Some(clean_value(value));
                current = Some(idx);
            } else if let Some(idx) = current {
                let extra = clean_value(line);
                if extra.is_empty() {
                    continue;
                }
                let value = values[idx].get_or_insert_with(String::new);
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(&extra);
            }
        }

        let mut fields = values.into_iter().enumerate().map(|(idx, value)| match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ReplyError::MissingField(FIELD_NAMES[idx])),
        });

        // Five entries, in FIELD_KEYS order.
        let mut next = || fields.next().unwrap_or(Err(ReplyError::Empty));
        Ok(Self {
            risk_highlight: next()?,
            why_risky: next()?,
            estimated_loss: next()?,
            safer_rewrite: next()?,
            dark_pattern: next()?,
        })
    }
}

fn clean_value(value: &str) -> String {
    value.trim().trim_matches('*').trim().to_string()
}

// ── Loss estimate ──

static RUPEE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^₹\s?\d[\d,]*(?:\.\d+)?$").expect("rupee pattern is valid"));

/// A parsed numeric-only loss reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LossReply {
    Amount(String),
    Unknown,
}

impl LossReply {
    /// Accepts a single `₹` amount; everything else reads as `Unknown`.
    pub fn parse(reply: &str) -> Self {
        let trimmed = reply
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
            .trim()
            .trim_end_matches('.');

        if RUPEE_AMOUNT.is_match(trimmed) {
            Self::Amount(trimmed.to_string())
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for LossReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(amount) => f.write_str(amount),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

// ── Validation ──

static CORRECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bCorrect\b").expect("token pattern is valid"));
static UNCERTAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bUncertain\b").expect("token pattern is valid"));

/// Binary outcome of the independent validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    NotConfirmed,
}

impl Verdict {
    /// `Correct` only when the reply carries the `Correct` token as a word and
    /// no `Uncertain` token. Empty or off-template replies are not confirmed.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if CORRECT.is_match(reply) && !UNCERTAIN.is_match(reply) {
            Self::Correct
        } else {
            Self::NotConfirmed
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

// ── Whole-document summary ──

/// One entry of the whole-document JSON array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRisk {
    pub clause: String,
    pub label: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub what_it_means: String,
    #[serde(default)]
    pub why_harmful: String,
    #[serde(default)]
    pub real_example: String,
    #[serde(default)]
    pub safer_alternative: String,
}

/// Parse the summary reply as a JSON array, ignoring markdown fences.
pub fn parse_summary(reply: &str) -> Result<Vec<ModelRisk>, ReplyError> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ReplyError::Empty);
    }
    Ok(serde_json::from_str(cleaned)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Risk Highlight: A late fee is charged on overdue payments.
Why it is risky (simple language): Missing one payment costs extra money.
Estimated possible loss (rough ₹ value): ₹2,000
Safer rewrite suggestion: Charge a small fee only after a grace period.
Dark pattern label (choose one: Hidden Fees, Auto-Renew Trap, Interest Trap, Penalty Trap, Forced Consent, Not risky): Penalty Trap";

    #[test]
    fn explanation_well_formed() {
        let e = Explanation::parse(WELL_FORMED).unwrap();
        assert_eq!(e.risk_highlight, "A late fee is charged on overdue payments.");
        assert_eq!(e.why_risky, "Missing one payment costs extra money.");
        assert_eq!(e.estimated_loss, "₹2,000");
        assert_eq!(e.safer_rewrite, "Charge a small fee only after a grace period.");
        assert_eq!(e.dark_pattern, "Penalty Trap");
    }

    #[test]
    fn explanation_with_markdown_and_continuations() {
        let reply = "\
**Risk Highlight:**
The lender can raise fees.
- **Why it is risky (simple language):** You pay more.
It can happen at any time.
**Estimated possible loss (rough ₹ value):** ₹10,000
**Safer rewrite suggestion:** Fix fees for the term.
**Dark pattern label:** Forced Consent";
        let e = Explanation::parse(reply).unwrap();
        assert_eq!(e.risk_highlight, "The lender can raise fees.");
        assert_eq!(e.why_risky, "You pay more.\nIt can happen at any time.");
        assert_eq!(e.dark_pattern, "Forced Consent");
    }

    #[test]
    fn explanation_missing_field_fails() {
        let reply = WELL_FORMED
            .lines()
            .filter(|l| !l.starts_with("Safer"))
            .collect::<Vec<_>>()
            .join("\n");
        match Explanation::parse(&reply) {
            Err(ReplyError::MissingField(name)) => assert_eq!(name, "Safer rewrite suggestion"),
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn explanation_empty_field_fails() {
        let reply = WELL_FORMED.replace("₹2,000", "");
        assert!(matches!(
            Explanation::parse(&reply),
            Err(ReplyError::MissingField("Estimated possible loss"))
        ));
    }

    #[test]
    fn explanation_free_text_fails() {
        assert!(Explanation::parse("This clause looks risky to me.").is_err());
        assert!(matches!(Explanation::parse("  \n "), Err(ReplyError::Empty)));
    }

    #[test]
    fn loss_amounts() {
        assert_eq!(LossReply::parse("₹5,000"), LossReply::Amount("₹5,000".into()));
        assert_eq!(LossReply::parse(" \"₹ 12000.50\" \n"), LossReply::Amount("₹ 12000.50".into()));
        assert_eq!(LossReply::parse("₹800."), LossReply::Amount("₹800".into()));
    }

    #[test]
    fn loss_unknown_and_garbage() {
        assert_eq!(LossReply::parse("Unknown"), LossReply::Unknown);
        assert_eq!(LossReply::parse(""), LossReply::Unknown);
        assert_eq!(LossReply::parse("About ₹5,000 per year"), LossReply::Unknown);
        assert_eq!(LossReply::parse("$50"), LossReply::Unknown);
        assert_eq!(LossReply::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn verdict_correct() {
        assert_eq!(Verdict::from_reply("Correct"), Verdict::Correct);
        assert_eq!(Verdict::from_reply("  Correct.\n"), Verdict::Correct);
        assert_eq!(Verdict::from_reply("Reply:\nCorrect"), Verdict::Correct);
    }

    #[test]
    fn verdict_not_confirmed() {
        for reply in [
            "",
            "   ",
            "Uncertain",
            "correctness uncertain",
            "Correctness uncertain",
            "correct",
            "The explanation seems fine\nbut I cannot say for sure",
            "Correct\nUncertain",
        ] {
            assert_eq!(
                Verdict::from_reply(reply),
                Verdict::NotConfirmed,
                "reply {reply:?} must not be trusted"
            );
        }
        assert!(!Verdict::NotConfirmed.is_trusted());
    }

    #[test]
    fn summary_with_fences() {
        let reply = "```json\n[{\"clause\": \"A late fee applies\", \"label\": \"Penalty Trap\", \"riskLevel\": \"High\"}]\n```";
        let risks = parse_summary(reply).unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].clause, "A late fee applies");
        assert_eq!(risks[0].risk_level, "High");
        assert!(risks[0].what_it_means.is_empty());
    }

    #[test]
    fn summary_empty_array() {
        assert!(parse_summary("[]").unwrap().is_empty());
    }

    #[test]
    fn summary_malformed() {
        assert!(matches!(parse_summary("Here are the risks: ..."), Err(ReplyError::Json(_))));
        assert!(matches!(parse_summary("```\n```"), Err(ReplyError::Empty)));
        assert!(parse_summary("[{\"label\": \"no clause\"}]").is_err());
    }
}
