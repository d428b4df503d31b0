//! Delimited (CSV/TSV/semicolon) table reading.

use std::io::Cursor;

use polars::prelude::*;
use tracing::debug;

use crate::decode::decode_text;
use crate::error::{IngestError, Result};
use crate::table::Grid;

/// Bytes inspected when guessing the delimiter.
pub const SNIFF_LEN: usize = 4096;

/// Guess the field delimiter from the header record.
///
/// Only unquoted characters of the first record count, so separators inside
/// quoted cell values never decide. Semicolon wins over tab, tab over comma;
/// comma is also the fallback.
pub fn detect_delimiter(text: &str) -> u8 {
    let head = header_record(&text.as_bytes()[..text.len().min(SNIFF_LEN)]);
    [b';', b'\t', b',']
        .into_iter()
        .find(|delimiter| head.contains(delimiter))
        .unwrap_or(b',')
}

/// Unquoted bytes of the first record, up to the first unquoted line break.
fn header_record(bytes: &[u8]) -> Vec<u8> {
    let mut in_quotes = false;
    let mut record = Vec::new();
    for &byte in bytes {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b'\n' | b'\r' if !in_quotes => break,
            _ if !in_quotes => record.push(byte),
            _ => {}
        }
    }
    record
}

/// Read delimited bytes into a raw grid of strings, header row included.
pub fn read_delimited(bytes: &[u8], locator: &str) -> Result<Grid> {
    let (text, encoding) = decode_text(bytes);
    let delimiter = detect_delimiter(&text);
    debug!(
        source = locator,
        encoding = encoding.name(),
        delimiter = %char::from(delimiter).escape_default(),
        "reading delimited table"
    );

    let cursor = Cursor::new(text.into_owned().into_bytes());
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_truncate_ragged_lines(true)
                .with_missing_is_null(false),
        )
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| IngestError::parse(locator, e))?;

    frame_to_grid(&df)
}

fn frame_to_grid(df: &DataFrame) -> Result<Grid> {
    let mut rows = vec![Vec::with_capacity(df.width()); df.height()];
    for column in df.get_columns() {
        let values = column.str()?;
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value.unwrap_or_default().to_string());
        }
    }
    Ok(rows)
}
