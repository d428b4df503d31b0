//! Match provenance attached to every resolved row.

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tier that produced a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    /// Best weighted-ratio similarity, 0-100.
    Fuzzy { score: u8 },
    NoMatch,
}

impl MatchKind {
    /// Tier position, best first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Prefix => 1,
            Self::Substring => 2,
            Self::Fuzzy { .. } => 3,
            Self::NoMatch => 4,
        }
    }

    pub fn is_match(self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    pub fn score(self) -> Option<u8> {
        match self {
            Self::Fuzzy { score } => Some(score),
            _ => None,
        }
    }

    /// Label without the fuzzy score, used for per-kind counts.
    pub fn name(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Prefix => "Prefix",
            Self::Substring => "Substring",
            Self::Fuzzy { .. } => "Fuzzy",
            Self::NoMatch => "No match",
        }
    }

    /// Sort key: tier rank, then higher fuzzy scores first.
    pub fn sort_key(self) -> (u8, Reverse<u8>) {
        (self.rank(), Reverse(self.score().unwrap_or(0)))
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fuzzy { score } => write!(f, "Fuzzy ({score})"),
            other => f.write_str(other.name()),
        }
    }
}

/// One output row of a lookup: the originating query, how it matched, and
/// the position of the matched reference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub query: String,
    pub kind: MatchKind,
    pub row: Option<usize>,
}

impl MatchResult {
    pub fn matched(query: impl Into<String>, kind: MatchKind, row: usize) -> Self {
        Self {
            query: query.into(),
            kind,
            row: Some(row),
        }
    }

    pub fn no_match(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: MatchKind::NoMatch,
            row: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind.is_match()
    }
}
