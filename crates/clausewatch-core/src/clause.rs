//! Clause segmentation for raw document text.
//!
//! Splits extracted text into candidate clauses so that rule detection and
//! model explanation can work one clause at a time.
//!
//! # Delimiters
//!
//! Any run of `.`, `;`, `!`, `?` or newline ends a clause. Fragments are
//! trimmed and empty fragments are dropped, so the output never contains
//! blank clauses. Decimal points are delimiters too: `$49.99` splits into
//! `$49` and `99`, so loss estimates read figures from the whole document.

/// A trimmed, non-empty span of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Zero-based position in document order.
    pub index: usize,
    pub text: String,
}

impl Clause {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '.' | ';' | '!' | '?' | '\n')
}

/// Split raw document text into ordered, trimmed, non-empty clauses.
///
/// Total function: empty or whitespace-only input yields an empty vector.
pub fn split_clauses(text: &str) -> Vec<Clause> {
    text.split(is_delimiter)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .enumerate()
        .map(|(index, fragment)| Clause {
            index,
            text: fragment.to_string(),
        })
        .collect()
}
