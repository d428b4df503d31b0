//! Mapping source descriptors and shared-sheet URL conversion.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use sha2::{Digest, Sha256};

static PUBLISHED_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/e/([A-Za-z0-9_-]+)").ok());
static DOCUMENT_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").ok());
static GID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[?&#]gid=(\d+)").ok());

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// Convert a shared spreadsheet link into its direct CSV export URL.
///
/// Published links (`/d/e/<id>`) become `pub?...&output=csv`, edit links
/// become `export?format=csv`; the sheet `gid` is carried over from the
/// query or fragment and defaults to `0`. Any other text is returned trimmed.
pub fn to_csv_export_url(link: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return String::new();
    }

    let gid = capture(&GID, link).unwrap_or("0");

    if let Some(id) = capture(&PUBLISHED_ID, link) {
        return format!("{SHEETS_BASE}/e/{id}/pub?gid={gid}&single=true&output=csv");
    }
    if let Some(id) = capture(&DOCUMENT_ID, link) {
        return format!("{SHEETS_BASE}/{id}/export?format=csv&gid={gid}");
    }
    link.to_string()
}

fn capture<'a>(pattern: &LazyLock<Option<Regex>>, text: &'a str) -> Option<&'a str> {
    pattern
        .as_ref()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether a CLI-style locator should be treated as a URL rather than a path.
pub fn looks_like_url(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Where a mapping table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    /// CSV/TSV/TXT or XLSX file on disk.
    File(PathBuf),
    /// A file already held in memory, e.g. an upload.
    Bytes { name: String, data: Arc<[u8]> },
    /// A table stored as a named entry inside a zip archive.
    Archive { path: PathBuf, entry: String },
    /// A shared spreadsheet link or direct CSV URL.
    Url(String),
}

impl MappingSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn archive(path: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            entry: entry.into(),
        }
    }

    pub fn url(link: impl Into<String>) -> Self {
        Self::Url(link.into())
    }

    /// Cache key identifying the resolved location of this source.
    pub fn key(&self) -> SourceKey {
        match self {
            Self::File(path) => SourceKey::File(resolve_path(path)),
            Self::Bytes { name, data } => SourceKey::Bytes {
                name: name.clone(),
                sha256: hex::encode(Sha256::digest(data)),
            },
            Self::Archive { path, entry } => SourceKey::Archive {
                path: resolve_path(path),
                entry: entry.clone(),
            },
            Self::Url(link) => SourceKey::Url(to_csv_export_url(link)),
        }
    }

    /// Short human-readable label used in logs and error messages.
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Bytes { name, .. } => name.clone(),
            Self::Archive { path, entry } => format!("{}!{entry}", path.display()),
            Self::Url(link) => to_csv_export_url(link),
        }
    }
}

fn resolve_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Identity of a loaded mapping, used for memoization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    File(PathBuf),
    Bytes { name: String, sha256: String },
    Archive { path: PathBuf, entry: String },
    Url(String),
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Bytes { name, sha256 } => {
                write!(f, "{name} (sha256 {})", &sha256[..sha256.len().min(12)])
            }
            Self::Archive { path, entry } => write!(f, "{}!{entry}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Every source the caller supplied; tried in priority order.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub file: Option<PathBuf>,
    pub upload: Option<(String, Arc<[u8]>)>,
    pub archive: Option<(PathBuf, String)>,
    pub url: Option<String>,
}

impl SourceConfig {
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_upload(mut self, name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        self.upload = Some((name.into(), data.into()));
        self
    }

    pub fn with_archive(mut self, path: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        self.archive = Some((path.into(), entry.into()));
        self
    }

    pub fn with_url(mut self, link: impl Into<String>) -> Self {
        let link = link.into();
        if !link.trim().is_empty() {
            self.url = Some(link);
        }
        self
    }

    /// Direct table (file, then upload), then archive entry, then URL.
    pub fn candidates(&self) -> Vec<MappingSource> {
        let mut sources = Vec::new();
        if let Some(path) = &self.file {
            sources.push(MappingSource::File(path.clone()));
        }
        if let Some((name, data)) = &self.upload {
            sources.push(MappingSource::Bytes {
                name: name.clone(),
                data: Arc::clone(data),
            });
        }
        if let Some((path, entry)) = &self.archive {
            sources.push(MappingSource::archive(path.clone(), entry.clone()));
        }
        if let Some(link) = &self.url {
            sources.push(MappingSource::Url(link.clone()));
        }
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.upload.is_none() && self.archive.is_none() && self.url.is_none()
    }
}

/// Physical layout of table bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Workbook,
    /// Pre-2007 binary workbook; not readable.
    LegacyWorkbook,
}

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

impl TableFormat {
    /// Pick a reader from the file name, sniffing the content when the
    /// extension is unknown.
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx" | "xlsm") => Self::Workbook,
            Some("xls") => Self::LegacyWorkbook,
            Some("csv" | "tsv" | "txt") => Self::Delimited,
            _ if bytes.starts_with(ZIP_SIGNATURE) => Self::Workbook,
            _ => Self::Delimited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1AbC-dEf_123";

    #[test]
    fn edit_link_without_gid_defaults_to_first_sheet() {
        let link = format!("https://docs.google.com/spreadsheets/d/{ID}/edit?usp=sharing");
        assert_eq!(
            to_csv_export_url(&link),
            format!("https://docs.google.com/spreadsheets/d/{ID}/export?format=csv&gid=0")
        );
    }

    #[test]
    fn edit_link_keeps_gid_from_fragment() {
        let link = format!("https://docs.google.com/spreadsheets/d/{ID}/edit#gid=123456");
        assert_eq!(
            to_csv_export_url(&link),
            format!("https://docs.google.com/spreadsheets/d/{ID}/export?format=csv&gid=123456")
        );
    }

    #[test]
    fn published_link_is_not_read_as_document_e() {
        let link = "https://docs.google.com/spreadsheets/d/e/2PACX-xyz/pubhtml?gid=7";
        assert_eq!(
            to_csv_export_url(link),
            "https://docs.google.com/spreadsheets/d/e/2PACX-xyz/pub?gid=7&single=true&output=csv"
        );
    }

    #[test]
    fn other_links_pass_through_trimmed() {
        assert_eq!(
            to_csv_export_url("  https://example.com/mapping.csv \n"),
            "https://example.com/mapping.csv"
        );
        assert_eq!(to_csv_export_url("   "), "");
    }

    #[test]
    fn url_keys_use_the_export_url() {
        let edit = MappingSource::url(format!("https://docs.google.com/spreadsheets/d/{ID}/edit"));
        let export = MappingSource::url(format!(
            "https://docs.google.com/spreadsheets/d/{ID}/export?format=csv&gid=0"
        ));
        assert_eq!(edit.key(), export.key());
    }

    #[test]
    fn byte_keys_hash_content() {
        let a = MappingSource::bytes("map.csv", b"a;b\n1;2\n".to_vec());
        let b = MappingSource::bytes("map.csv", b"a;b\n1;3\n".to_vec());
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn candidates_follow_priority() {
        let config = SourceConfig::default()
            .with_url("https://example.com/m.csv")
            .with_archive("bundle.zip", "m.csv")
            .with_file("m.csv");
        let candidates = config.candidates();
        assert!(matches!(candidates[0], MappingSource::File(_)));
        assert!(matches!(candidates[1], MappingSource::Archive { .. }));
        assert!(matches!(candidates[2], MappingSource::Url(_)));
    }

    #[test]
    fn blank_url_is_ignored() {
        assert!(SourceConfig::default().with_url("  ").is_empty());
    }

    #[test]
    fn format_detection() {
        assert_eq!(TableFormat::detect("map.CSV", b""), TableFormat::Delimited);
        assert_eq!(TableFormat::detect("map.xlsx", b""), TableFormat::Workbook);
        assert_eq!(TableFormat::detect("map.xls", b""), TableFormat::LegacyWorkbook);
        assert_eq!(TableFormat::detect("upload", b"PK\x03\x04rest"), TableFormat::Workbook);
        assert_eq!(TableFormat::detect("upload", b"a,b"), TableFormat::Delimited);
    }

    #[test]
    fn url_detection() {
        assert!(looks_like_url("https://docs.google.com/x"));
        assert!(looks_like_url("HTTP://host/x.csv"));
        assert!(!looks_like_url("./mapping.csv"));
    }
}
