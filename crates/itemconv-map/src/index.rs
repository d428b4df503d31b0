//! Normalized key index over the reference table's key columns.

use std::collections::HashMap;

use itemconv_model::NormalizationPolicy;

use crate::normalize::normalize;

/// One distinct normalized key and the rows carrying it.
#[derive(Debug, Clone)]
pub struct IndexedKey {
    pub text: String,
    /// Length in characters, cached for the partial tiers.
    pub chars: usize,
    /// Ascending, without repeats.
    pub rows: Vec<usize>,
}

/// Distinct normalized keys in first-seen order: row by row, and within a
/// row in the order the key columns were given.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: Vec<IndexedKey>,
    positions: HashMap<String, usize>,
}

impl KeyIndex {
    /// Index every non-empty normalized value of `columns`, which must all
    /// have the same length.
    pub fn build(columns: &[Vec<Option<&str>>], policy: NormalizationPolicy) -> Self {
        let mut index = Self::default();
        let height = columns.iter().map(Vec::len).max().unwrap_or(0);

        for row in 0..height {
            for column in columns {
                let Some(Some(raw)) = column.get(row) else {
                    continue;
                };
                let key = normalize(raw, policy);
                if !key.is_empty() {
                    index.insert(key, row);
                }
            }
        }

        index
    }

    fn insert(&mut self, key: String, row: usize) {
        if let Some(&position) = self.positions.get(&key) {
            let rows = &mut self.keys[position].rows;
            if rows.last() != Some(&row) {
                rows.push(row);
            }
            return;
        }
        self.positions.insert(key.clone(), self.keys.len());
        self.keys.push(IndexedKey {
            chars: key.chars().count(),
            text: key,
            rows: vec![row],
        });
    }

    /// Rows whose key equals `key` exactly.
    pub fn exact(&self, key: &str) -> Option<&[usize]> {
        self.positions
            .get(key)
            .map(|&position| self.keys[position].rows.as_slice())
    }

    pub fn keys(&self) -> &[IndexedKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_both_key_columns() {
        let old = vec![Some("MTO-1"), Some("MTO-2"), None];
        let ean = vec![Some("0571"), Some("0571"), Some("mto 1")];
        let index = KeyIndex::build(&[old, ean], NormalizationPolicy::AlphanumericFold);

        assert_eq!(index.exact("MTO1"), Some([0, 2].as_slice()));
        assert_eq!(index.exact("0571"), Some([0, 1].as_slice()));
        let order: Vec<&str> = index.keys().iter().map(|k| k.text.as_str()).collect();
        assert_eq!(order, vec!["MTO1", "0571", "MTO2"]);
    }

    #[test]
    fn empty_keys_are_skipped() {
        let old = vec![Some("--"), Some("")];
        let index = KeyIndex::build(&[old], NormalizationPolicy::AlphanumericFold);
        assert!(index.is_empty());
    }

    #[test]
    fn same_key_in_both_columns_lists_row_once() {
        let old = vec![Some("123")];
        let ean = vec![Some("123")];
        let index = KeyIndex::build(&[old, ean], NormalizationPolicy::Strict);
        assert_eq!(index.exact("123"), Some([0].as_slice()));
    }
}
