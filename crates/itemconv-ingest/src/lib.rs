//! Input side of the item converter.
//!
//! - Query token parsing for pasted identifier lists
//! - Mapping sources: local files, in-memory uploads, zip entries, shared sheet links
//! - Table reading: delimiter sniffing, encoding detection, XLSX worksheets
//! - Case-insensitive column resolution and a process-lifetime mapping cache

pub mod archive;
pub mod cache;
pub mod decode;
pub mod delimited;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod source;
pub mod table;
pub mod tokens;
pub mod workbook;

pub use archive::{ArchiveEntry, read_archive_entry};
pub use cache::MappingCache;
pub use decode::decode_text;
pub use delimited::{detect_delimiter, read_delimited};
pub use error::{ErrorKind, IngestError, Result, SHARING_HINT};
pub use fetch::{HttpFetch, ReqwestFetcher};
pub use loader::{LoadedMapping, load_mapping, resolve_columns};
pub use source::{
    MappingSource, SourceConfig, SourceKey, TableFormat, looks_like_url, to_csv_export_url,
};
pub use table::{Grid, header_names, table_from_grid};
pub use tokens::parse_query_tokens;
pub use workbook::read_workbook;
