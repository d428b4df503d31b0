//! Configuration options for item lookups.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 65;
pub const DEFAULT_MIN_PARTIAL_LEN: usize = 3;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SHEET_NAME: &str = "Item Conversion";

/// Transform applied to query tokens and reference keys before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// Trim surrounding whitespace only.
    Strict,
    /// Upper-case and keep only ASCII letters and digits.
    #[default]
    AlphanumericFold,
    /// Trim, and strip leading zeros from all-digit values.
    NumericLeadingZeroFold,
}

/// Which resolution tiers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSelection {
    ExactOnly,
    /// Exact, prefix and substring.
    Partial,
    /// Every tier including fuzzy.
    #[default]
    Full,
}

impl TierSelection {
    pub fn includes_partial(self) -> bool {
        !matches!(self, Self::ExactOnly)
    }

    pub fn includes_fuzzy(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// How many rows a token keeps when its winning tier finds several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatch {
    #[default]
    All,
    First,
}

/// Ordering of rows in the projected result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrder {
    /// Exact, prefix, substring, fuzzy (best score first), no match.
    #[default]
    ByMatchKind,
    InputOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
        }
    }
}

/// Parameters of the resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStrategy {
    pub normalization: NormalizationPolicy,
    pub tiers: TierSelection,
    /// Minimum weighted-ratio score (0-100) for a fuzzy match.
    pub fuzzy_threshold: u8,
    /// Shorter side of a prefix/substring comparison must be at least this long.
    pub min_partial_len: usize,
    pub multi_match: MultiMatch,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        Self {
            normalization: NormalizationPolicy::default(),
            tiers: TierSelection::default(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            min_partial_len: DEFAULT_MIN_PARTIAL_LEN,
            multi_match: MultiMatch::default(),
        }
    }
}

impl MatchStrategy {
    /// Exact lookups on trimmed values only.
    pub fn strict() -> Self {
        Self {
            normalization: NormalizationPolicy::Strict,
            tiers: TierSelection::ExactOnly,
            ..Self::default()
        }
    }

    /// Looser fuzzy acceptance and shorter partial matches.
    pub fn relaxed() -> Self {
        Self {
            fuzzy_threshold: 55,
            min_partial_len: 2,
            ..Self::default()
        }
    }

    pub fn with_normalization(mut self, normalization: NormalizationPolicy) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_tiers(mut self, tiers: TierSelection) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: u8) -> Self {
        self.fuzzy_threshold = threshold.min(100);
        self
    }

    pub fn with_min_partial_len(mut self, len: usize) -> Self {
        self.min_partial_len = len;
        self
    }

    pub fn with_multi_match(mut self, multi_match: MultiMatch) -> Self {
        self.multi_match = multi_match;
        self
    }
}

/// Everything a lookup run needs besides the inputs themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupOptions {
    pub strategy: MatchStrategy,
    pub order: ResultOrder,
    pub export_format: ExportFormat,
    pub sheet_name: String,
    pub fetch_timeout_secs: u64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::default(),
            order: ResultOrder::default(),
            export_format: ExportFormat::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl LookupOptions {
    pub fn strict() -> Self {
        Self {
            strategy: MatchStrategy::strict(),
            ..Self::default()
        }
    }

    pub fn relaxed() -> Self {
        Self {
            strategy: MatchStrategy::relaxed(),
            ..Self::default()
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_snapshot() {
        insta::assert_json_snapshot!(LookupOptions::default(), @r#"
        {
          "strategy": {
            "normalization": "alphanumeric_fold",
            "tiers": "full",
            "fuzzy_threshold": 65,
            "min_partial_len": 3,
            "multi_match": "all"
          },
          "order": "by_match_kind",
          "export_format": "xlsx",
          "sheet_name": "Item Conversion",
          "fetch_timeout_secs": 30
        }
        "#);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: LookupOptions =
            serde_json::from_str(r#"{"strategy": {"tiers": "exact_only"}, "order": "input_order"}"#)
                .unwrap();
        assert_eq!(options.strategy.tiers, TierSelection::ExactOnly);
        assert_eq!(options.strategy.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(options.order, ResultOrder::InputOrder);
        assert_eq!(options.sheet_name, DEFAULT_SHEET_NAME);
    }

    #[test]
    fn presets() {
        let strict = LookupOptions::strict();
        assert_eq!(strict.strategy.tiers, TierSelection::ExactOnly);
        assert_eq!(strict.strategy.normalization, NormalizationPolicy::Strict);

        let relaxed = MatchStrategy::relaxed();
        assert!(relaxed.fuzzy_threshold < DEFAULT_FUZZY_THRESHOLD);
        assert!(relaxed.tiers.includes_fuzzy());
    }

    #[test]
    fn threshold_is_capped() {
        let strategy = MatchStrategy::default().with_fuzzy_threshold(140);
        assert_eq!(strategy.fuzzy_threshold, 100);
    }
}
