//! Explanatory risk pattern catalog used for whole-document scanning.
//!
//! Each pattern pairs trigger keywords with a label, a severity, plain-language
//! explanation strings, and a loss [`Estimator`]. Declaration order is the
//! report order, so the catalog is an ordered slice rather than a map.

use serde::{Deserialize, Serialize};

use crate::estimate::Estimator;

/// Risk severity attached to a pattern or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Lenient parse for model-supplied levels (`"high"`, `" Medium "`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A static explanatory risk pattern.
#[derive(Debug)]
pub struct RiskPattern {
    pub label: &'static str,
    pub severity: Severity,
    /// Lowercase trigger phrases, matched as case-insensitive substrings.
    pub keywords: &'static [&'static str],
    pub what_it_means: &'static str,
    pub why_harmful: &'static str,
    pub estimator: Estimator,
    pub safer_alternative: &'static str,
}

impl RiskPattern {
    /// Keywords occurring in `lower_text`, which must already be ASCII-lowercased.
    pub fn found_keywords(&self, lower_text: &str) -> Vec<&'static str> {
        self.keywords
            .iter()
            .copied()
            .filter(|kw| lower_text.contains(kw))
            .collect()
    }
}

/// The fixed pattern catalog, in report order.
pub static CATALOG: &[RiskPattern] = &[
    RiskPattern {
        label: "Hidden Fee",
        severity: Severity::High,
        keywords: &[
            "hidden fee",
            "processing fee",
            "processing charge",
            "service fee may apply",
            "administrative fee",
            "handling charge",
        ],
        what_it_means: "This means they can charge you extra money that wasn't clearly mentioned upfront.",
        why_harmful: "These surprise charges add up quickly. You might think you're paying ₹1000, but end up paying ₹1500 or more.",
        estimator: Estimator::AnnualFee,
        safer_alternative: "All fees should be listed clearly before you agree. Optional charges should need your permission first.",
    },
    RiskPattern {
        label: "Auto Renew",
        severity: Severity::High,
        keywords: &[
            "auto-renew",
            "automatic renewal",
            "automatically renew",
            "renew without notice",
        ],
        what_it_means: "Your subscription will continue and charge you automatically, even if you forgot about it or don't want it anymore.",
        why_harmful: "Many people forget to cancel and end up paying for services they don't use. Companies make it hard to cancel on purpose.",
        estimator: Estimator::RenewalCharge,
        safer_alternative: "The service should stop automatically unless you choose to continue. Cancellation should be easy and instant.",
    },
    RiskPattern {
        label: "Forced Consent",
        severity: Severity::Medium,
        keywords: &[
            "without prior notice",
            "without notice",
            "may change at any time",
            "at our discretion",
            "sole discretion",
            "without prior intimation",
            "reserves the right to modify",
        ],
        what_it_means: "They can change the rules, prices, or terms whenever they want without telling you first.",
        why_harmful: "You could wake up to higher prices or worse service with no warning. You lose control over your own money.",
        estimator: Estimator::PriceChange,
        safer_alternative: "Any changes should be announced at least 30 days in advance, and you should be able to cancel without penalty if you don't like the changes.",
    },
    RiskPattern {
        label: "Penalty Trap",
        severity: Severity::High,
        keywords: &[
            "late fee",
            "late payment fee",
            "penalty",
            "default interest",
            "penalty charge",
        ],
        what_it_means: "If you're even one day late with payment, they'll charge you extra money as punishment.",
        why_harmful: "Late fees can be huge (₹500-₹3000 each time). If you miss one payment, the penalties can snowball quickly.",
        estimator: Estimator::LatePenalty,
        safer_alternative: "Late fees should be small (max ₹100) and only charged after a grace period. You should get a reminder before any penalty.",
    },
    RiskPattern {
        label: "Hidden Fee",
        severity: Severity::High,
        keywords: &[
            "dynamic interest",
            "variable interest",
            "interest may increase",
            "rate may change",
            "adjustable rate",
            "modify the annual percentage rate",
            "modify the apr",
        ],
        what_it_means: "The interest rate on your loan can go up at any time, making you pay more money back.",
        why_harmful: "What starts as a 10% loan could become 15% or 20%. You'll end up paying thousands more than you expected.",
        estimator: Estimator::InterestRate,
        safer_alternative: "Interest rates should be locked in and can't change. Any rate changes should need your written approval.",
    },
    RiskPattern {
        label: "Data Privacy",
        severity: Severity::High,
        keywords: &[
            "share anonymized data",
            "third-party marketing",
            "share your data",
            "irrevocable license",
            "sell your info",
            "share credit history",
        ],
        what_it_means: "You are giving them permission to share or sell your personal and financial details to other companies for ads or credit scoring.",
        why_harmful: "Your private data (spending habits, credit score) could be sold to advertisers or insurers, leading to spam or higher rates elsewhere.",
        estimator: Estimator::DataSharing,
        safer_alternative: "Data sharing should be optional (opt-in) and not required for using the service.",
    },
];
