//! Query token parsing for pasted identifier lists.

use std::collections::HashSet;

const QUOTES: [char; 6] = ['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == ';'
}

/// Split pasted text into distinct query tokens, keeping first-seen order.
///
/// Tokens are separated by any run of whitespace, commas or semicolons. One
/// surrounding quote character is removed from each end of a token; tokens
/// that end up empty are dropped. Duplicates are compared exactly.
pub fn parse_query_tokens(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for piece in raw.split(is_separator) {
        let token = strip_quotes(piece);
        if token.is_empty() {
            continue;
        }
        if seen.insert(token) {
            tokens.push(token.to_string());
        }
    }

    tokens
}

fn strip_quotes(piece: &str) -> &str {
    let mut token = piece.trim();
    if let Some(rest) = token.strip_prefix(QUOTES) {
        token = rest;
    }
    if let Some(rest) = token.strip_suffix(QUOTES) {
        token = rest;
    }
    token.trim()
}
