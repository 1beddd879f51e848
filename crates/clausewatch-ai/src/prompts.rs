//! Fixed instruction templates sent to the reasoning service.

use crate::reasoner::GenerateRequest;

/// Explanation template. The reply must carry five labelled fields.
pub const CLAUSE_PROMPT: &str = "\
You are a financial risk reviewer.
Explain ONLY what is clearly written.
Do NOT guess beyond what is written.

Respond exactly:

Risk Highlight:
Why it is risky (simple language):
Estimated possible loss (rough ₹ value):
Safer rewrite suggestion:
Dark pattern label (choose one: Hidden Fees, Auto-Renew Trap, Interest Trap, Penalty Trap, Forced Consent, Not risky):

Clause:
";

/// Numeric-only loss template.
pub const LOSS_PROMPT: &str = "\
Estimate realistic possible money loss from this clause for an average Indian user.

Output:
- only a number with ₹ sign
- no explanation
- if uncertain: Unknown

Clause:
";

/// Independent check of an explanation against its clause.
pub const VALIDATION_PROMPT: &str = "\
Check if this explanation strictly matches the clause and does not assume anything.

If any guess exists:
Reply exactly: Uncertain

If everything matches:
Reply exactly: Correct

Clause:
";

/// Whole-document analysis, answered as a JSON array.
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
You are an expert financial contract analyzer. Your job is to identify risky clauses in financial documents.
Return the output MERELY as a valid JSON array of objects. Do not include markdown formatting.
Fields: clause, label, riskLevel (High/Medium/Low), whatItMeans, whyHarmful, realExample (in INR), saferAlternative.
Copy each clause exactly as it appears in the document.
If no risks found, return [].";

pub const PING_PROMPT: &str = "Say 'Groq is ready' in one short sentence.";

pub fn explanation_request(clause: &str) -> GenerateRequest {
    GenerateRequest::user(format!("{CLAUSE_PROMPT}{clause}"))
}

pub fn loss_request(clause: &str) -> GenerateRequest {
    GenerateRequest::user(format!("{LOSS_PROMPT}{clause}"))
}

pub fn validation_request(clause: &str, explanation: &str) -> GenerateRequest {
    GenerateRequest::user(format!(
        "{VALIDATION_PROMPT}\"{clause}\"\n\nExplanation:\n\"{explanation}\""
    ))
}

pub fn summary_request(document: &str) -> GenerateRequest {
    GenerateRequest::user(document).with_system(SUMMARY_SYSTEM_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_is_appended_after_template() {
        let req = explanation_request("A late fee of $25 applies");
        assert!(req.user_prompt.starts_with(CLAUSE_PROMPT));
        assert!(req.user_prompt.ends_with("Clause:\nA late fee of $25 applies"));
        assert!(req.system_prompt.is_none());
    }

    #[test]
    fn explanation_template_lists_five_fields() {
        for field in [
            "Risk Highlight:",
            "Why it is risky",
            "Estimated possible loss",
            "Safer rewrite suggestion:",
            "Dark pattern label",
        ] {
            assert!(CLAUSE_PROMPT.contains(field), "missing {field}");
        }
        assert!(CLAUSE_PROMPT.contains("Do NOT guess"));
    }

    #[test]
    fn loss_template_allows_unknown() {
        let req = loss_request("fee");
        assert!(req.user_prompt.contains("if uncertain: Unknown"));
        assert!(req.user_prompt.ends_with("Clause:\nfee"));
    }

    #[test]
    fn validation_quotes_clause_and_explanation() {
        let req = validation_request("the clause", "the explanation");
        assert!(req.user_prompt.starts_with(VALIDATION_PROMPT));
        assert!(req.user_prompt.contains("\"the clause\""));
        assert!(req.user_prompt.ends_with("Explanation:\n\"the explanation\""));
        assert!(req.user_prompt.contains("Reply exactly: Correct"));
        assert!(req.user_prompt.contains("Reply exactly: Uncertain"));
    }

    #[test]
    fn summary_uses_system_prompt() {
        let req = summary_request("document text");
        assert_eq!(req.user_prompt, "document text");
        assert_eq!(req.system_prompt.as_deref(), Some(SUMMARY_SYSTEM_PROMPT));
    }
}
