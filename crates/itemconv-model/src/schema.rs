//! Canonical column names and the ordered output schema.

pub const NEW_ITEM_NO: &str = "New Item No.";
pub const OLD_ITEM_VARIANT: &str = "OLD Item-variant";
pub const EAN_NO: &str = "Ean no.";
pub const DESCRIPTION: &str = "Description";
pub const FAMILY: &str = "Family";
pub const CATEGORY: &str = "Category";

/// Column holding the user's query in the result table.
pub const QUERY_COLUMN: &str = "Your input";
/// Column holding the match kind label in the result table.
pub const MATCH_COLUMN: &str = "Match";

pub const OUTPUT_HEADERS: [&str; 6] = [
    NEW_ITEM_NO,
    OLD_ITEM_VARIANT,
    EAN_NO,
    DESCRIPTION,
    FAMILY,
    CATEGORY,
];

/// Reference columns searched by the resolution engine.
pub const KEY_COLUMNS: [&str; 2] = [OLD_ITEM_VARIANT, EAN_NO];

/// Ordered list of payload columns copied into every result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    headers: Vec<String>,
}

impl OutputSchema {
    pub fn canonical() -> Self {
        Self::new(OUTPUT_HEADERS)
    }

    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Headers of the projected result table: query, match label, payload.
    pub fn result_headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.headers.len() + 2);
        headers.push(QUERY_COLUMN.to_string());
        headers.push(MATCH_COLUMN.to_string());
        headers.extend(self.headers.iter().cloned());
        headers
    }

    /// Every name the loader must try to resolve: output headers followed by
    /// any key column the headers do not already include.
    pub fn required_names(&self) -> Vec<String> {
        let mut names = self.headers.clone();
        for key in KEY_COLUMNS {
            if !names.iter().any(|name| name.eq_ignore_ascii_case(key)) {
                names.push(key.to_string());
            }
        }
        names
    }
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::canonical()
    }
}
