use thiserror::Error;

/// Errors raised while preparing a resolution engine.
#[derive(Debug, Error)]
pub enum MapError {
    /// A key column is not present in the column map.
    #[error("key column '{column}' is not resolved in the mapping table")]
    MissingKeyColumn { column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for MapError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
