//! Export of the result table as a downloadable spreadsheet.

use std::path::{Path, PathBuf};

use itemconv_model::ExportFormat;
use polars::prelude::*;
use tracing::info;

use crate::error::{OutputError, Result};
use crate::xlsx::write_xlsx;

/// Encoded export plus what a browser or mail client needs to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBuffer {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
}

impl ExportBuffer {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `<stem>.<ext>` for the buffer's format.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }
}

/// Encode `df` as a single-sheet workbook or CSV.
pub fn encode(df: &DataFrame, format: ExportFormat, sheet_name: &str) -> Result<ExportBuffer> {
    let bytes = match format {
        ExportFormat::Xlsx => write_xlsx(df, sheet_name)?,
        ExportFormat::Csv => write_csv(df)?,
    };
    Ok(ExportBuffer { bytes, format })
}

fn write_csv(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(buffer)
}

/// Encode and write to `path`, creating parent directories.
pub fn write_export(
    path: &Path,
    df: &DataFrame,
    format: ExportFormat,
    sheet_name: &str,
) -> Result<PathBuf> {
    let buffer = encode(df, format, sheet_name)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| OutputError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, &buffer.bytes).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        format = buffer.format.extension(),
        rows = df.height(),
        bytes = buffer.bytes.len(),
        "export written"
    );
    Ok(path.to_path_buf())
}
