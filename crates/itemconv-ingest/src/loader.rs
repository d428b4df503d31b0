//! Loading a reference table from any supported source.

use std::path::Path;
use std::time::Instant;

use itemconv_model::{ColumnMap, OutputSchema};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::archive::read_archive_entry;
use crate::delimited::read_delimited;
use crate::error::{IngestError, Result};
use crate::fetch::HttpFetch;
use crate::source::{MappingSource, SourceKey, TableFormat, to_csv_export_url};
use crate::table::{header_names, table_from_grid};
use crate::workbook::read_workbook;

/// A reference table ready for resolution.
#[derive(Debug, Clone)]
pub struct LoadedMapping {
    /// Every column has dtype `String`; values and headers are trimmed.
    pub table: DataFrame,
    pub columns: ColumnMap,
    pub key: SourceKey,
    pub format: TableFormat,
}

impl LoadedMapping {
    pub fn row_count(&self) -> usize {
        self.table.height()
    }

    pub fn headers(&self) -> Vec<String> {
        header_names(&self.table)
    }

    /// Fail unless both key columns were found.
    pub fn require_key_columns(&self) -> Result<()> {
        let missing = self.columns.missing_keys();
        if missing.is_empty() {
            return Ok(());
        }
        Err(IngestError::Schema {
            missing: missing.into_iter().map(str::to_string).collect(),
            found: self.headers(),
        })
    }
}

/// Match the schema's canonical names against a table's headers.
pub fn resolve_columns(table: &DataFrame, schema: &OutputSchema) -> ColumnMap {
    ColumnMap::resolve(header_names(table), schema.required_names())
}

/// Load one mapping source into a table and its column map.
pub fn load_mapping(
    source: &MappingSource,
    fetcher: &dyn HttpFetch,
    schema: &OutputSchema,
) -> Result<LoadedMapping> {
    let key = source.key();
    let span = info_span!("load_mapping", source = %key);
    let _guard = span.enter();
    let start = Instant::now();

    let (name, bytes) = read_source_bytes(source, fetcher)?;
    let format = TableFormat::detect(&name, &bytes);
    let locator = source.label();

    let grid = match format {
        TableFormat::Delimited => read_delimited(&bytes, &locator)?,
        TableFormat::Workbook => read_workbook(&bytes, &locator)?,
        TableFormat::LegacyWorkbook => {
            return Err(IngestError::parse(
                locator,
                "legacy .xls workbooks are not supported; save the sheet as .xlsx or .csv",
            ));
        }
    };
    let table = table_from_grid(grid, &locator)?;
    let columns = resolve_columns(&table, schema);

    info!(
        rows = table.height(),
        columns = table.width(),
        missing = ?columns.missing(),
        duration_ms = start.elapsed().as_millis(),
        "mapping loaded"
    );

    Ok(LoadedMapping {
        table,
        columns,
        key,
        format,
    })
}

/// Raw bytes of a source plus the name used for format detection.
fn read_source_bytes(source: &MappingSource, fetcher: &dyn HttpFetch) -> Result<(String, Vec<u8>)> {
    match source {
        MappingSource::File(path) => Ok((file_name(path), read_file(path)?)),
        MappingSource::Bytes { name, data } => Ok((name.clone(), data.to_vec())),
        MappingSource::Archive { path, entry } => {
            let entry = read_archive_entry(path, entry)?;
            Ok((entry.name, entry.bytes))
        }
        MappingSource::Url(link) => {
            let url = to_csv_export_url(link);
            if url.is_empty() {
                return Err(IngestError::NoSourceConfigured);
            }
            // Export URLs carry no extension; content sniffing decides.
            Ok((String::new(), fetcher.fetch(&url)?))
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        };
        IngestError::unavailable(path.display().to_string(), reason)
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
