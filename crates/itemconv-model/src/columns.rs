//! Canonical-to-actual column resolution.

use serde::Serialize;

use crate::lookup::CaseInsensitiveSet;
use crate::schema::{EAN_NO, KEY_COLUMNS, OLD_ITEM_VARIANT};

/// Maps each canonical column name to the header actually present in a
/// loaded reference table, or `None` when the table lacks it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    entries: Vec<(String, Option<String>)>,
}

impl ColumnMap {
    /// Resolve `required` names against `actual_headers`, ignoring case.
    pub fn resolve<H, S, R, T>(actual_headers: H, required: R) -> Self
    where
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let actual = CaseInsensitiveSet::new(actual_headers);
        let entries = required
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_string(), actual.get(name).map(str::to_string))
            })
            .collect();
        Self { entries }
    }

    /// Actual header for a canonical name.
    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(canonical))
            .and_then(|(_, actual)| actual.as_deref())
    }

    pub fn old_item_column(&self) -> Option<&str> {
        self.get(OLD_ITEM_VARIANT)
    }

    pub fn ean_column(&self) -> Option<&str> {
        self.get(EAN_NO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, actual)| (name.as_str(), actual.as_deref()))
    }

    /// Canonical names with no matching header, in resolution order.
    pub fn missing(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, actual)| actual.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Key columns that could not be resolved.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        KEY_COLUMNS
            .into_iter()
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
