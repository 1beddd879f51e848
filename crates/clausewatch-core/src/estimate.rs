//! Heuristic loss estimation for matched risk patterns.
//!
//! Estimates are illustrative, not financial advice. Figures found in the
//! text are read as USD-denominated and converted to INR at a fixed rate;
//! when no figure is present each category falls back to a canned range.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Fixed USD → INR multiplier.
pub const USD_TO_INR: f64 = 83.0;

/// Optional `$`, digits with optional thousands groups, optional cents.
static CURRENCY_NUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?\d+(?:,\d{3})*(?:\.\d{2})?").expect("currency pattern is valid")
});

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent pattern is valid"));

/// Loss estimator attached to a risk pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Estimator {
    /// Recurring fee: one charge up to twelve charges a year.
    AnnualFee,
    /// Charge repeated every renewal period.
    RenewalCharge,
    /// Unilateral price or term changes. No numeric input.
    PriceChange,
    /// Per-incident penalty, four incidents a year as the upper bound.
    LatePenalty,
    /// Rate increase derived from the first percentage in the text.
    InterestRate,
    /// Data sharing. No monetary estimate.
    DataSharing,
}

impl Estimator {
    /// Produce a localized loss string for the matched text. Never fails.
    pub fn estimate(&self, text: &str) -> String {
        match self {
            Self::AnnualFee => match first_amount(text) {
                Some(amount) => format!(
                    "You could lose {} to {} per year in unexpected fees.",
                    format_inr(to_inr(amount)),
                    format_inr(to_inr(amount * 12.0)),
                ),
                None => "You could lose ₹4,000 to ₹40,000 per year in unexpected fees.".to_string(),
            },
            Self::RenewalCharge => match first_amount(text) {
                Some(amount) => format!(
                    "If you forget to cancel: {} wasted every renewal period.",
                    format_inr(to_inr(amount)),
                ),
                None => "If you forget to cancel: ₹8,000 to ₹40,000 wasted per year.".to_string(),
            },
            Self::PriceChange => {
                "Unpredictable losses - they could increase prices by 20-50% overnight.".to_string()
            }
            Self::LatePenalty => match first_amount(text) {
                Some(amount) => {
                    let per_incident = to_inr(amount);
                    format!(
                        "{} penalty each time you're late. Could be {}+ per year.",
                        format_inr(per_incident),
                        format_inr(per_incident * 4),
                    )
                }
                None => "₹2,000 to ₹8,000 in penalties per incident.".to_string(),
            },
            Self::InterestRate => match first_percent(text) {
                Some(rate) => {
                    let increase = rate * 0.5;
                    format!(
                        "Your interest could increase by {:.1}% to {:.1}%, costing you ₹20,000 to ₹4,00,000 extra over the loan period.",
                        increase,
                        increase * 2.0,
                    )
                }
                None => "Interest increases could cost you ₹50,000 to ₹5,00,000 extra over the loan period.".to_string(),
            },
            Self::DataSharing => {
                "Loss of privacy and potential increase in spam/targeted ads.".to_string()
            }
        }
    }
}

/// First currency-like figure in `text`, with `$` and separators stripped.
pub fn first_amount(text: &str) -> Option<f64> {
    let m = CURRENCY_NUM.find(text)?;
    let cleaned: String = m.as_str().chars().filter(|c| !matches!(c, '$' | ',')).collect();
    cleaned.parse().ok()
}

/// First percentage figure in `text` (the number before `%`).
pub fn first_percent(text: &str) -> Option<f64> {
    PERCENT.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Convert a USD figure to whole rupees.
pub fn to_inr(usd: f64) -> i64 {
    (usd * USD_TO_INR).round() as i64
}

/// Format whole rupees with the `₹` glyph and Indian digit grouping.
///
/// 4150 → `₹4,150`, 400000 → `₹4,00,000`.
pub fn format_inr(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₹{}", group_indian(amount.unsigned_abs()))
}

/// Last three digits form one group, then groups of two.
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indian_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1000), "₹1,000");
        assert_eq!(format_inr(4150), "₹4,150");
        assert_eq!(format_inr(49800), "₹49,800");
        assert_eq!(format_inr(100000), "₹1,00,000");
        assert_eq!(format_inr(400000), "₹4,00,000");
        assert_eq!(format_inr(1195698), "₹11,95,698");
        assert_eq!(format_inr(10000000), "₹1,00,00,000");
        assert_eq!(format_inr(-4150), "-₹4,150");
    }

    #[test]
    fn to_inr_rounds() {
        assert_eq!(to_inr(50.0), 4150);
        assert_eq!(to_inr(1200.5), 99642);
    }

    #[test]
    fn first_amount_variants() {
        assert_eq!(first_amount("a fee of $50 monthly"), Some(50.0));
        assert_eq!(first_amount("pay $1,200.50 now"), Some(1200.5));
        assert_eq!(first_amount("charge 35 per month"), Some(35.0));
        assert_eq!(first_amount("no figures at all"), None);
    }

    #[test]
    fn first_percent_variants() {
        assert_eq!(first_percent("Your rate is 10% and may increase"), Some(10.0));
        assert_eq!(first_percent("APR of 7.5 % applies"), Some(7.5));
        assert_eq!(first_percent("no rate"), None);
    }

    #[test]
    fn annual_fee_with_amount() {
        let estimate =
            Estimator::AnnualFee.estimate("There is a processing fee of $50 applied monthly.");
        assert_eq!(
            estimate,
            "You could lose ₹4,150 to ₹49,800 per year in unexpected fees."
        );
    }

    #[test]
    fn annual_fee_with_cents_and_separators() {
        let estimate = Estimator::AnnualFee.estimate("An administrative fee of $1,200.50 applies");
        assert!(estimate.contains("₹99,642"), "{estimate}");
        assert!(estimate.contains("₹11,95,698"), "{estimate}");
    }

    #[test]
    fn annual_fee_canned() {
        assert_eq!(
            Estimator::AnnualFee.estimate("hidden fee applies"),
            "You could lose ₹4,000 to ₹40,000 per year in unexpected fees."
        );
    }

    #[test]
    fn renewal_charge() {
        assert_eq!(
            Estimator::RenewalCharge.estimate("auto-renew at $10"),
            "If you forget to cancel: ₹830 wasted every renewal period."
        );
        assert!(Estimator::RenewalCharge.estimate("auto-renew").contains("₹8,000 to ₹40,000"));
    }

    #[test]
    fn late_penalty() {
        assert_eq!(
            Estimator::LatePenalty.estimate("late fee of $25"),
            "₹2,075 penalty each time you're late. Could be ₹8,300+ per year."
        );
        assert_eq!(
            Estimator::LatePenalty.estimate("a penalty applies"),
            "₹2,000 to ₹8,000 in penalties per incident."
        );
    }

    #[test]
    fn interest_rate_half_and_double() {
        let estimate =
            Estimator::InterestRate.estimate("Your rate is 10% and may increase at our discretion");
        assert!(estimate.contains("5.0% to 10.0%"), "{estimate}");
    }

    #[test]
    fn interest_rate_canned() {
        assert!(
            Estimator::InterestRate
                .estimate("variable interest")
                .contains("₹50,000 to ₹5,00,000")
        );
    }

    #[test]
    fn fixed_estimators_ignore_numbers() {
        assert_eq!(
            Estimator::PriceChange.estimate("$500 at our discretion"),
            Estimator::PriceChange.estimate("")
        );
        assert_eq!(
            Estimator::DataSharing.estimate("share your data for $5"),
            "Loss of privacy and potential increase in spam/targeted ads."
        );
    }
}
