//! Building the reference `DataFrame` from a raw grid of cells.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::warn;

use crate::error::{IngestError, Result};

/// Rows of raw cell text; the first non-blank row is the header.
pub type Grid = Vec<Vec<String>>;

/// Turn a raw grid into a table whose every column is `String`.
///
/// Blank rows are skipped, headers and values are trimmed, short rows are
/// padded and long rows truncated to the header width. Blank or repeated
/// headers are renamed so every column stays addressable.
pub fn table_from_grid(grid: Grid, locator: &str) -> Result<DataFrame> {
    let mut rows = grid
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    let Some(header_row) = rows.next() else {
        return Err(IngestError::parse(locator, "no header row found"));
    };
    let headers = unique_headers(header_row.iter().map(|h| h.trim()), locator);

    let width = headers.len();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); width];
    for row in rows {
        let mut cells = row.into_iter();
        for column in &mut columns {
            let value = cells.next().unwrap_or_default();
            column.push(value.trim().to_string());
        }
    }

    if columns.first().is_none_or(Vec::is_empty) {
        return Err(IngestError::EmptyTable {
            locator: locator.to_string(),
        });
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name.into(), values))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Make header names unique: blanks become `column_<n>`, repeats get a
/// numeric suffix starting at 2.
pub fn unique_headers<'a, I>(headers: I, locator: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 2;
        while !seen.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        if name != header {
            warn!(source = locator, header, renamed = %name, "renamed blank or duplicate header");
        }
        names.push(name);
    }

    names
}

/// Header names of a loaded table.
pub fn header_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect()
    }

    #[test]
    fn trims_and_pads() {
        let df = table_from_grid(
            grid(&[&[" Ean no. ", "Family"], &["  0571  ", "Sofa"], &["0572"]]),
            "t",
        )
        .unwrap();
        assert_eq!(header_names(&df), vec!["Ean no.", "Family"]);
        let ean = df.column("Ean no.").unwrap().str().unwrap();
        assert_eq!(ean.get(0), Some("0571"));
        let family = df.column("Family").unwrap().str().unwrap();
        assert_eq!(family.get(1), Some(""));
    }

    #[test]
    fn skips_blank_rows_and_truncates_long_rows() {
        let df = table_from_grid(
            grid(&[&["", ""], &["a", "b"], &[" ", ""], &["1", "2", "3"]]),
            "t",
        )
        .unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn renames_blank_and_duplicate_headers() {
        let names = unique_headers(["Family", "", "Family", "Family"], "t");
        assert_eq!(names, vec!["Family", "column_2", "Family_2", "Family_3"]);
    }

    #[test]
    fn header_only_is_empty_table() {
        let err = table_from_grid(grid(&[&["a", "b"]]), "t").unwrap_err();
        assert!(matches!(err, IngestError::EmptyTable { .. }));
    }

    #[test]
    fn nothing_is_parse_error() {
        let err = table_from_grid(Vec::new(), "t").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }
}
