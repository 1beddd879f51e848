//! Vertical card display for risk records and saved reports.

use std::fmt::Write;

use clausewatch_ai::pipeline::UNTRUSTED_WARNING;
use clausewatch_core::{AnalysisResponse, RiskRecord, Source};
use clausewatch_store::StoredReport;

const LABEL_WIDTH: usize = 20;

// ── Public API ──

/// Print every record of a response as a card, followed by a footer.
pub fn print_response(response: &AnalysisResponse) {
    print!("{}", render_response(response));
}

pub fn print_history(user_id: &str, reports: &[StoredReport]) {
    if reports.is_empty() {
        println!("No saved reports for {user_id}.");
        return;
    }
    println!("=== Reports for {user_id} ({}) ===", reports.len());
    for report in reports {
        let title = report.title.as_deref().unwrap_or("(untitled)");
        println!(
            "  {:<32} {}  {:<30} {} risks",
            report.id,
            report.created_at.format("%Y-%m-%d %H:%M"),
            title,
            report.response.results.iter().filter(|r| !r.is_clean()).count()
        );
    }
}

pub fn print_report(report: &StoredReport) {
    println!("Report {}", report.id);
    if let Some(title) = &report.title {
        println!("  {:<w$} {title}", "Title", w = LABEL_WIDTH);
    }
    println!("  {:<w$} {}", "Saved", report.created_at.to_rfc3339(), w = LABEL_WIDTH);
    println!();
    print_response(&report.response);
}

// ── Rendering ──

fn render_response(response: &AnalysisResponse) -> String {
    let mut out = String::new();
    for (i, record) in response.results.iter().enumerate() {
        out.push_str(&render_card(i + 1, record));
    }

    if response.results.is_empty() {
        out.push_str("No clauses were flagged.\n");
    }
    if let Some(source) = response.source {
        let note = match source {
            Source::RegexOnly => "rule-based analysis (no reasoning service)",
            Source::ModelSummary => "whole-document model summary (not validated)",
        };
        let _ = writeln!(out, "Source: {note}");
    }
    let untrusted = response.untrusted_count();
    if untrusted > 0 {
        let _ = writeln!(out, "{untrusted} record(s) need manual verification.");
    }
    if let Some(warning) = &response.warning {
        let _ = writeln!(out, "Warning: {warning}");
    }
    out
}

fn render_card(n: usize, record: &RiskRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {n}. {} [{}] ===", record.label, record.risk_level.as_str());
    if !record.trusted {
        let _ = writeln!(out, "{UNTRUSTED_WARNING}");
    }
    out.push('\n');

    section(&mut out, "Clause", &[("text", record.clause.as_str())]);
    section(
        &mut out,
        "Explanation",
        &[
            ("what it means", record.what_it_means.as_str()),
            ("why harmful", record.why_harmful.as_str()),
            ("dark pattern", record.dark_pattern.as_deref().unwrap_or("")),
        ],
    );
    section(
        &mut out,
        "Impact",
        &[
            ("estimated loss", record.estimated_loss.as_str()),
            ("safer alternative", record.safer_alternative.as_str()),
        ],
    );
    section(
        &mut out,
        "Trust",
        &[
            ("status", record.status.as_str()),
            ("validation", record.validation.as_deref().unwrap_or("")),
        ],
    );
    out
}

/// Skipped entirely when every value is empty.
fn section(out: &mut String, header: &str, rows: &[(&str, &str)]) {
    if rows.iter().all(|(_, value)| value.trim().is_empty()) {
        return;
    }
    let _ = writeln!(out, "{header}");
    for (name, value) in rows {
        if value.trim().is_empty() {
            continue;
        }
        let mut lines = value.lines();
        let first = lines.next().unwrap_or("");
        let _ = writeln!(out, "  {name:<w$} {first}", w = LABEL_WIDTH);
        for line in lines {
            let _ = writeln!(out, "  {:<w$} {line}", "", w = LABEL_WIDTH);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use clausewatch_core::RecordStatus;

    use super::*;

    #[test]
    fn clean_card_has_no_warning() {
        let card = render_card(1, &RiskRecord::clean());
        assert!(card.starts_with("=== 1. Clean [Low] ==="));
        assert!(!card.contains(UNTRUSTED_WARNING));
        assert!(card.contains("rule-only"));
        assert!(!card.contains("dark pattern"));
    }

    #[test]
    fn untrusted_card_is_flagged() {
        let mut record = RiskRecord::clean();
        record.trusted = false;
        record.status = RecordStatus::Unverified;
        record.validation = Some("Uncertain".into());
        let card = render_card(2, &record);
        assert!(card.contains(UNTRUSTED_WARNING));
        assert!(card.contains("Uncertain"));
    }

    #[test]
    fn multi_line_values_are_indented() {
        let mut out = String::new();
        section(&mut out, "Explanation", &[("why harmful", "line one\nline two")]);
        let expected = format!("  {:<20} line two\n", "");
        assert!(out.contains(&expected));
    }

    #[test]
    fn empty_section_is_skipped() {
        let mut out = String::new();
        section(&mut out, "Trust", &[("validation", ""), ("status", " ")]);
        assert!(out.is_empty());
    }

    #[test]
    fn response_footer() {
        let response = AnalysisResponse::new(vec![], None).with_warning("quota");
        let text = render_response(&response);
        assert!(text.contains("No clauses were flagged."));
        assert!(text.contains("Warning: quota"));
        assert!(!text.contains("Source:"));
    }
}
