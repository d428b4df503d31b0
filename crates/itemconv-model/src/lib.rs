//! Shared data model for the item number converter.
//!
//! Everything here is plain data: the canonical column names of the
//! reference table, the case-insensitive column map built at load time,
//! the tagged match results produced by the resolution engine, and the
//! serde-backed lookup options.

pub mod columns;
pub mod lookup;
pub mod matching;
pub mod options;
pub mod schema;

pub use columns::ColumnMap;
pub use lookup::CaseInsensitiveSet;
pub use matching::{MatchKind, MatchResult};
pub use options::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FUZZY_THRESHOLD, DEFAULT_MIN_PARTIAL_LEN,
    DEFAULT_SHEET_NAME, ExportFormat, LookupOptions, MatchStrategy, MultiMatch,
    NormalizationPolicy, ResultOrder, TierSelection,
};
pub use schema::{
    CATEGORY, DESCRIPTION, EAN_NO, FAMILY, KEY_COLUMNS, MATCH_COLUMN, NEW_ITEM_NO,
    OLD_ITEM_VARIANT, OUTPUT_HEADERS, OutputSchema, QUERY_COLUMN,
};
