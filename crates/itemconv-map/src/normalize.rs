//! Identifier normalization applied to both sides of every comparison.

use itemconv_model::NormalizationPolicy;

/// Normalize an identifier under `policy`. Every policy is idempotent.
pub fn normalize(raw: &str, policy: NormalizationPolicy) -> String {
    match policy {
        NormalizationPolicy::Strict => raw.trim().to_string(),
        NormalizationPolicy::AlphanumericFold => compact_key(raw),
        NormalizationPolicy::NumericLeadingZeroFold => fold_leading_zeros(raw.trim()),
    }
}

/// Upper-cases, then keeps only ASCII letters and digits.
fn compact_key(value: &str) -> String {
    value
        .to_uppercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn fold_leading_zeros(value: &str) -> String {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }
    match value.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}
