//! Reading a mapping table stored inside a zip archive.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// One extracted archive member.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Extract `entry` from the zip at `path`.
///
/// The entry is matched by full name, then case-insensitively, then by its
/// file name ignoring directories, so `Mapping.CSV` finds `data/mapping.csv`.
pub fn read_archive_entry(path: &Path, entry: &str) -> Result<ArchiveEntry> {
    let file = File::open(path).map_err(|e| {
        IngestError::unavailable(path.display().to_string(), format!("cannot open archive: {e}"))
    })?;
    extract_entry(file, path, entry)
}

/// Same as [`read_archive_entry`] for an already opened reader.
pub fn extract_entry<R: Read + Seek>(reader: R, path: &Path, entry: &str) -> Result<ArchiveEntry> {
    let locator = path.display().to_string();
    let mut archive = ZipArchive::new(reader).map_err(|e| IngestError::parse(&locator, e))?;

    let names: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();

    let Some(name) = find_entry(&names, entry) else {
        let mut available = names;
        available.sort();
        return Err(IngestError::ArchiveEntryMissing {
            archive: path.to_path_buf(),
            entry: entry.to_string(),
            available,
        });
    };

    let mut file = archive
        .by_name(&name)
        .map_err(|e| IngestError::parse(&locator, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| IngestError::parse(&locator, e))?;

    debug!(archive = %locator, entry = %name, bytes = bytes.len(), "extracted archive entry");
    Ok(ArchiveEntry { name, bytes })
}

fn find_entry(names: &[String], wanted: &str) -> Option<String> {
    let wanted = wanted.trim().trim_start_matches('/');
    names
        .iter()
        .find(|name| name.as_str() == wanted)
        .or_else(|| names.iter().find(|name| name.eq_ignore_ascii_case(wanted)))
        .or_else(|| {
            names.iter().find(|name| {
                name.rsplit('/')
                    .next()
                    .is_some_and(|base| base.eq_ignore_ascii_case(wanted))
            })
        })
        .cloned()
}
