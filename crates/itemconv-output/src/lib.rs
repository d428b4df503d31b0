//! Output side of the item converter: projecting match results onto the
//! canonical column layout, summarizing them, and exporting XLSX or CSV.

pub mod error;
pub mod export;
pub mod projection;
pub mod summary;
pub mod xlsx;

pub use error::{OutputError, Result};
pub use export::{ExportBuffer, encode, write_export};
pub use projection::{order_results, project};
pub use summary::LookupSummary;
pub use xlsx::{sanitize_sheet_name, write_xlsx};
