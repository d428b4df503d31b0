//! Tiered resolution of query tokens against the reference table.
//!
//! Each token is normalized and tried against the key index tier by tier,
//! stopping at the first tier that yields at least one row:
//!
//! 1. exact key
//! 2. a key is a prefix of the token
//! 3. the token is a prefix of a key
//! 4. substring either way
//! 5. best weighted-ratio score at or above the threshold
//!
//! Tokens that fall through every tier produce a single no-match result.

use std::collections::BTreeSet;
use std::time::Instant;

use itemconv_model::{
    ColumnMap, EAN_NO, MatchKind, MatchResult, MatchStrategy, MultiMatch, OLD_ITEM_VARIANT,
};
use polars::prelude::DataFrame;
use tracing::{debug, info, trace};

use crate::error::{MapError, Result};
use crate::index::{IndexedKey, KeyIndex};
use crate::normalize::normalize;
use crate::score::weighted_ratio;

/// Resolves tokens against one loaded reference table.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    strategy: MatchStrategy,
    index: KeyIndex,
}

impl ResolutionEngine {
    /// Build the key index from the table's old-identifier and EAN columns.
    pub fn new(table: &DataFrame, columns: &ColumnMap, strategy: MatchStrategy) -> Result<Self> {
        let start = Instant::now();
        let mut key_values = Vec::with_capacity(2);
        for canonical in [OLD_ITEM_VARIANT, EAN_NO] {
            let actual = columns
                .get(canonical)
                .ok_or_else(|| MapError::MissingKeyColumn {
                    column: canonical.to_string(),
                })?;
            let values: Vec<Option<&str>> = table.column(actual)?.str()?.into_iter().collect();
            key_values.push(values);
        }

        let index = KeyIndex::build(&key_values, strategy.normalization);
        info!(
            rows = table.height(),
            keys = index.len(),
            policy = ?strategy.normalization,
            duration_ms = start.elapsed().as_millis(),
            "resolution index built"
        );
        Ok(Self { strategy, index })
    }

    /// Resolve every token in order. Each token yields at least one result.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<MatchResult> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(tokens.len());
        let mut matched = 0usize;

        for token in tokens {
            let token_results = self.resolve_one(token.as_ref());
            if token_results.first().is_some_and(MatchResult::is_match) {
                matched += 1;
            }
            results.extend(token_results);
        }

        info!(
            tokens = tokens.len(),
            matched,
            unmatched = tokens.len() - matched,
            rows = results.len(),
            duration_ms = start.elapsed().as_millis(),
            "resolution complete"
        );
        results
    }

    /// Resolve a single token.
    pub fn resolve_one(&self, token: &str) -> Vec<MatchResult> {
        let normalized = normalize(token, self.strategy.normalization);
        let Some((kind, mut rows)) = self.find(&normalized) else {
            trace!(query = token, normalized = %normalized, "no match");
            return vec![MatchResult::no_match(token)];
        };

        if self.strategy.multi_match == MultiMatch::First {
            rows.truncate(1);
        }
        debug!(tier = kind.name(), score = kind.score(), rows = rows.len(), "token resolved");
        trace!(query = token, normalized = %normalized, %kind, "match");

        rows.into_iter()
            .map(|row| MatchResult::matched(token, kind, row))
            .collect()
    }

    fn find(&self, token: &str) -> Option<(MatchKind, Vec<usize>)> {
        if token.is_empty() {
            return None;
        }
        if let Some(rows) = self.index.exact(token) {
            return Some((MatchKind::Exact, rows.to_vec()));
        }
        if !self.strategy.tiers.includes_partial() {
            return None;
        }

        let token_len = token.chars().count();
        let min = self.strategy.min_partial_len;

        let rows = self.rows_where(|key| {
            key.chars >= min && key.chars < token_len && token.starts_with(key.text.as_str())
        });
        if !rows.is_empty() {
            return Some((MatchKind::Prefix, rows));
        }

        let rows = self.rows_where(|key| {
            token_len >= min && token_len < key.chars && key.text.starts_with(token)
        });
        if !rows.is_empty() {
            return Some((MatchKind::Prefix, rows));
        }

        let rows = self.rows_where(|key| {
            key.chars.min(token_len) >= min
                && (key.text.contains(token) || token.contains(key.text.as_str()))
        });
        if !rows.is_empty() {
            return Some((MatchKind::Substring, rows));
        }

        if !self.strategy.tiers.includes_fuzzy() {
            return None;
        }
        self.best_fuzzy(token)
    }

    /// Union of rows of every key satisfying `predicate`, ascending.
    fn rows_where(&self, predicate: impl Fn(&IndexedKey) -> bool) -> Vec<usize> {
        let mut rows = BTreeSet::new();
        for key in self.index.keys().iter().filter(|key| predicate(key)) {
            rows.extend(key.rows.iter().copied());
        }
        rows.into_iter().collect()
    }

    /// Highest scoring key; ties keep the earliest key.
    fn best_fuzzy(&self, token: &str) -> Option<(MatchKind, Vec<usize>)> {
        let mut best: Option<(u8, &IndexedKey)> = None;
        for key in self.index.keys() {
            let score = weighted_ratio(token, &key.text);
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, key));
                if score == 100 {
                    break;
                }
            }
        }

        let (score, key) = best?;
        if score < self.strategy.fuzzy_threshold {
            debug!(best_score = score, threshold = self.strategy.fuzzy_threshold, "fuzzy below threshold");
            return None;
        }
        Some((MatchKind::Fuzzy { score }, key.rows.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemconv_model::{OUTPUT_HEADERS, TierSelection};
    use polars::prelude::*;

    fn engine(old: &[&str], ean: &[&str], strategy: MatchStrategy) -> ResolutionEngine {
        let table = df! {
            "OLD Item-variant" => old,
            "Ean no." => ean,
        }
        .unwrap();
        let columns = ColumnMap::resolve(["OLD Item-variant", "Ean no."], OUTPUT_HEADERS);
        ResolutionEngine::new(&table, &columns, strategy).unwrap()
    }

    fn kinds_and_rows(results: &[MatchResult]) -> Vec<(MatchKind, Option<usize>)> {
        results.iter().map(|r| (r.kind, r.row)).collect()
    }

    #[test]
    fn exact_after_normalization() {
        let engine = engine(&["MTO-CHAIR-001-01"], &["5712345000013"], MatchStrategy::default());
        let results = engine.resolve_one("mto chair 001 01");
        assert_eq!(kinds_and_rows(&results), vec![(MatchKind::Exact, Some(0))]);
        assert_eq!(results[0].query, "mto chair 001 01");
    }

    #[test]
    fn mapping_prefix_of_query_before_query_prefix_of_mapping() {
        let engine = engine(
            &["MTO-SOFA", "MTO-SOFA-01-02-EXTRA"],
            &["", ""],
            MatchStrategy::default(),
        );
        let results = engine.resolve_one("MTO-SOFA-01");
        assert_eq!(kinds_and_rows(&results), vec![(MatchKind::Prefix, Some(0))]);
    }

    #[test]
    fn query_prefix_of_mapping() {
        let engine = engine(&["MTO-SOFA-01-02"], &[""], MatchStrategy::default());
        let results = engine.resolve_one("MTO-SOFA");
        assert_eq!(kinds_and_rows(&results), vec![(MatchKind::Prefix, Some(0))]);
    }

    #[test]
    fn substring_either_way() {
        let engine = engine(&["XX-SOFA-01", "LAMP"], &["", ""], MatchStrategy::default());
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("SOFA01")),
            vec![(MatchKind::Substring, Some(0))]
        );
    }

    #[test]
    fn substring_key_inside_token() {
        let engine = engine(&["LAMP-9", "CHAIR-2", "SOFA"], &["", "", ""], MatchStrategy::default());
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("XXSOFAYY")),
            vec![(MatchKind::Substring, Some(2))]
        );
    }

    #[test]
    fn partial_tiers_respect_min_length() {
        let engine = engine(&["AB-1234567"], &[""], MatchStrategy::default().with_tiers(TierSelection::Partial));
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("AB")),
            vec![(MatchKind::NoMatch, None)]
        );
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("AB1")),
            vec![(MatchKind::Prefix, Some(0))]
        );
    }

    #[test]
    fn fuzzy_accepts_typos_above_threshold() {
        let engine = engine(&["MTO-CHAIR-001-01", "LAMP-9"], &["", ""], MatchStrategy::default());
        let results = engine.resolve_one("MTO-CHIAR-001-01");
        assert_eq!(
            kinds_and_rows(&results),
            vec![(MatchKind::Fuzzy { score: 92 }, Some(0))]
        );
    }

    #[test]
    fn fuzzy_ties_keep_the_earliest_key() {
        let engine = engine(&["ABCDX", "ABCDY"], &["", ""], MatchStrategy::default());
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("ABCDZ")),
            vec![(MatchKind::Fuzzy { score: 80 }, Some(0))]
        );
    }

    #[test]
    fn fuzzy_winner_emits_every_row_of_its_key() {
        let engine = engine(
            &["MTO-CHAIR-001-01", "LAMP-9", "MTO-CHAIR-001-01"],
            &["", "", ""],
            MatchStrategy::default(),
        );
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("MTO-CHIAR-001-01")),
            vec![
                (MatchKind::Fuzzy { score: 92 }, Some(0)),
                (MatchKind::Fuzzy { score: 92 }, Some(2)),
            ]
        );
    }

    #[test]
    fn fuzzy_below_threshold_is_no_match() {
        let engine = engine(&["MTO-CHAIR-001-01"], &[""], MatchStrategy::default());
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("UNKNOWN-99")),
            vec![(MatchKind::NoMatch, None)]
        );
    }

    #[test]
    fn exact_only_skips_other_tiers() {
        let engine = engine(&["MTO-SOFA-01"], &[""], MatchStrategy::default().with_tiers(TierSelection::ExactOnly));
        assert!(!engine.resolve_one("MTO-SOFA").first().unwrap().is_match());
    }

    #[test]
    fn duplicate_keys_return_every_row_in_table_order() {
        let engine = engine(
            &["MTO-1", "MTO-2", "MTO-3"],
            &["05712345000013", "", "05712345000013"],
            MatchStrategy::default(),
        );
        let results = engine.resolve_one("05712345000013");
        assert_eq!(
            kinds_and_rows(&results),
            vec![(MatchKind::Exact, Some(0)), (MatchKind::Exact, Some(2))]
        );
    }

    #[test]
    fn first_only_keeps_one_row() {
        let engine = engine(
            &["MTO-1", "MTO-3"],
            &["0571", "0571"],
            MatchStrategy::default().with_multi_match(MultiMatch::First),
        );
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("0571")),
            vec![(MatchKind::Exact, Some(0))]
        );
    }

    #[test]
    fn token_normalizing_to_empty_is_no_match() {
        let engine = engine(&["MTO-1"], &[""], MatchStrategy::default());
        assert_eq!(
            kinds_and_rows(&engine.resolve_one("--")),
            vec![(MatchKind::NoMatch, None)]
        );
    }

    #[test]
    fn missing_key_column_is_rejected() {
        let table = df! { "OLD Item-variant" => &["MTO-1"] }.unwrap();
        let columns = ColumnMap::resolve(["OLD Item-variant"], OUTPUT_HEADERS);
        let err = ResolutionEngine::new(&table, &columns, MatchStrategy::default()).unwrap_err();
        assert!(matches!(err, MapError::MissingKeyColumn { column } if column == EAN_NO));
    }
}
