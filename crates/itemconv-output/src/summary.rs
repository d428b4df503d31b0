//! Aggregate counts for a finished lookup.

use std::collections::HashSet;

use itemconv_model::{MatchKind, MatchResult};

/// Counts reported after a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSummary {
    /// Distinct tokens parsed from the input.
    pub tokens: usize,
    /// Result rows, including no-match placeholders.
    pub rows: usize,
    /// Tokens with at least one matched row.
    pub matched_tokens: usize,
    /// Result rows per match kind, best tier first; kinds with no rows are left out.
    pub by_kind: Vec<(&'static str, usize)>,
    /// Tokens without any match, in input order.
    pub not_found: Vec<String>,
}

const KIND_ORDER: [MatchKind; 5] = [
    MatchKind::Exact,
    MatchKind::Prefix,
    MatchKind::Substring,
    MatchKind::Fuzzy { score: 0 },
    MatchKind::NoMatch,
];

impl LookupSummary {
    pub fn from_results<S: AsRef<str>>(tokens: &[S], results: &[MatchResult]) -> Self {
        let matched: HashSet<&str> = results
            .iter()
            .filter(|r| r.is_match())
            .map(|r| r.query.as_str())
            .collect();

        let not_found = tokens
            .iter()
            .map(AsRef::as_ref)
            .filter(|token| !matched.contains(token))
            .map(str::to_string)
            .collect();

        let by_kind = KIND_ORDER
            .into_iter()
            .map(|kind| {
                let count = results.iter().filter(|r| r.kind.rank() == kind.rank()).count();
                (kind.name(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        Self {
            tokens: tokens.len(),
            rows: results.len(),
            matched_tokens: matched.len(),
            by_kind,
            not_found,
        }
    }

    /// Rows that point at a reference row.
    pub fn matched_rows(&self) -> usize {
        self.rows - self.not_found.len()
    }
}
