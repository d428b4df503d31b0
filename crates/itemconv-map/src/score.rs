//! Weighted string similarity for the fuzzy tier.
//!
//! Scores are on a 0-100 scale. The weighted ratio takes the best of a plain
//! indel ratio, a token-sort ratio for strings of similar length, and a
//! partial (best window) ratio that is discounted as the length gap grows.

use rapidfuzz::fuzz;

/// Token-sort is only tried when the longer string is under this many times
/// the shorter one; above it the partial ratio is used instead.
const PARTIAL_LEN_RATIO: f64 = 1.5;
/// Length ratio from which the partial ratio gets the heavier discount.
const LONG_PARTIAL_LEN_RATIO: f64 = 8.0;
const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Normalized indel similarity, 0-100.
pub fn ratio(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best ratio of the shorter string against every equally long window of the
/// longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let score = fuzz::ratio(short.iter().copied(), window.iter().copied()) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Ratio after sorting whitespace-separated tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Combined similarity, rounded to an integer 0-100. Empty input scores 0.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let mut best = ratio(a, b);

    if len_ratio < PARTIAL_LEN_RATIO {
        best = best.max(token_sort_ratio(a, b) * TOKEN_SCALE);
    } else {
        let scale = if len_ratio < LONG_PARTIAL_LEN_RATIO {
            PARTIAL_SCALE
        } else {
            LONG_PARTIAL_SCALE
        };
        best = best.max(partial_ratio(a, b) * scale);
    }

    best.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(weighted_ratio("MTOCHAIR00101", "MTOCHAIR00101"), 100);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(weighted_ratio("", "MTO"), 0);
        assert_eq!(weighted_ratio("MTO", ""), 0);
    }

    #[test]
    fn transposition_scores_high() {
        // 13 characters with one swapped pair: two indels out of 26.
        assert_eq!(weighted_ratio("MTOCHIAR00101", "MTOCHAIR00101"), 92);
    }

    #[test]
    fn unrelated_codes_score_low() {
        assert!(weighted_ratio("ABCDEFGH", "12345678") < 20);
    }

    #[test]
    fn partial_ratio_finds_embedded_window() {
        assert_eq!(partial_ratio("SOFA", "MTOSOFA01"), 100.0);
        assert_eq!(partial_ratio("MTOSOFA01", "SOFA"), 100.0);
    }

    #[test]
    fn partial_match_is_discounted_by_length_gap() {
        // Length ratio 2.25 -> partial ratio scaled by 0.9.
        assert_eq!(weighted_ratio("SOFA", "MTOSOFA01"), 90);
        // Length ratio 8 -> partial ratio scaled by 0.6.
        assert_eq!(weighted_ratio("AB", "XXXXXXXXXXXXXXAB"), 60);
    }

    #[test]
    fn token_order_is_ignored_for_similar_lengths() {
        assert_eq!(token_sort_ratio("CHAIR FIBER", "FIBER CHAIR"), 100.0);
        assert_eq!(weighted_ratio("CHAIR FIBER", "FIBER CHAIR"), 95);
    }
}
