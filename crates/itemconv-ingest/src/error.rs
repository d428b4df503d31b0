//! Error types for mapping ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Hint shown when a shared sheet cannot be downloaded anonymously.
pub const SHARING_HINT: &str = "make sure the sheet is shared with 'anyone with the link' \
     or published to the web (File > Share > Publish to web)";

/// Errors that can occur while loading a mapping table.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Source Errors ===
    /// File missing, download failed, or remote refused access.
    #[error("mapping source unavailable: {locator}: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// Zip archive exists but lacks the expected table entry.
    #[error(
        "archive {} has no entry named '{entry}' (available: {})",
        .archive.display(),
        .available.join(", ")
    )]
    ArchiveEntryMissing {
        archive: PathBuf,
        entry: String,
        available: Vec<String>,
    },

    /// No source was supplied at all.
    #[error("no mapping source configured")]
    NoSourceConfigured,

    // === Parse Errors ===
    /// Content could not be decoded as a table.
    #[error("failed to parse {locator}: {message}")]
    Parse { locator: String, message: String },

    /// Table has a header row but no data.
    #[error("mapping table {locator} has no data rows")]
    EmptyTable { locator: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Schema Errors ===
    /// Key columns could not be resolved against the table headers.
    #[error(
        "required lookup columns not found: {} (found headers: {})",
        .missing.join(", "),
        .found.join(", ")
    )]
    Schema {
        missing: Vec<String>,
        found: Vec<String>,
    },
}

/// Coarse classification used by callers to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    Parse,
    Schema,
}

impl IngestError {
    pub fn unavailable(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(locator: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable { .. }
            | Self::ArchiveEntryMissing { .. }
            | Self::NoSourceConfigured => ErrorKind::SourceUnavailable,
            Self::Parse { .. } | Self::EmptyTable { .. } | Self::DataFrame { .. } => {
                ErrorKind::Parse
            }
            Self::Schema { .. } => ErrorKind::Schema,
        }
    }

    /// Whether the next configured source should be tried instead.
    pub fn is_unavailable(&self) -> bool {
        self.kind() == ErrorKind::SourceUnavailable
    }

    /// Short message suitable for end users.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::SourceUnavailable => {
                "Could not load the mapping table. Check the file path or sharing settings."
            }
            ErrorKind::Parse => "The mapping table could not be read as CSV or Excel.",
            ErrorKind::Schema => {
                "The mapping table is missing the 'OLD Item-variant' or 'Ean no.' column."
            }
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
