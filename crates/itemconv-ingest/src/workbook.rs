//! Minimal reader for the first worksheet of an Office Open XML workbook.
//!
//! Only what a reference table needs is supported: shared strings, inline
//! strings and raw cell values taken verbatim as text. Formulas are read as
//! their cached value; styles and number formats are ignored.

use std::io::{Cursor, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{IngestError, Result};
use crate::table::Grid;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Read the first worksheet of an XLSX file into a raw grid.
pub fn read_workbook(bytes: &[u8], locator: &str) -> Result<Grid> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::parse(locator, e))?;

    let shared = match read_entry(&mut archive, SHARED_STRINGS) {
        Ok(xml) => parse_shared_strings(&xml).map_err(|e| IngestError::parse(locator, e))?,
        Err(ZipError::FileNotFound) => Vec::new(),
        Err(e) => return Err(IngestError::parse(locator, e)),
    };

    let sheet = first_worksheet(&archive)
        .ok_or_else(|| IngestError::parse(locator, "workbook contains no worksheets"))?;
    let xml = read_entry(&mut archive, &sheet).map_err(|e| IngestError::parse(locator, e))?;
    parse_sheet(&xml, &shared).map_err(|e| IngestError::parse(locator, e))
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> std::result::Result<String, ZipError> {
    let mut entry = archive.by_name(name)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Worksheet part with the lowest sheet number.
fn first_worksheet<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix(WORKSHEET_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name))
        })
        .min_by_key(|(number, _)| *number)
        .map(|(_, name)| name.to_string())
}

/// Text of every `<si>` item, rich-text runs concatenated, phonetic runs skipped.
fn parse_shared_strings(xml: &str) -> std::result::Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = phonetic_depth == 0,
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(text) if in_text => push_text(&mut current, &text)?,
            Event::GeneralRef(entity) if in_text => push_entity(&mut current, &entity)?,
            Event::CData(data) if in_text => current.push_str(&String::from_utf8_lossy(&data)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

#[derive(Default)]
struct CellState {
    column: Option<usize>,
    kind: CellKind,
    value: String,
    capturing: bool,
}

#[derive(Default, PartialEq, Eq)]
enum CellKind {
    Shared,
    Inline,
    #[default]
    Raw,
}

fn parse_sheet(xml: &str, shared: &[String]) -> std::result::Result<Grid, String> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Grid = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = CellState::default();
    let mut in_row = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = true;
                    row.clear();
                }
                b"c" if in_row => cell = start_cell(&e, row.len()),
                b"v" | b"t" => cell.capturing = true,
                _ => {}
            },
            Event::Empty(e) if in_row && e.local_name().as_ref() == b"c" => {
                let empty = start_cell(&e, row.len());
                place(&mut row, empty.column, String::new());
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => rows.push(Vec::new()),
            Event::Text(text) if cell.capturing => push_text(&mut cell.value, &text)?,
            Event::GeneralRef(entity) if cell.capturing => push_entity(&mut cell.value, &entity)?,
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => cell.capturing = false,
                b"c" if in_row => {
                    let finished = std::mem::take(&mut cell);
                    let value = cell_value(finished.kind, finished.value, shared)?;
                    place(&mut row, finished.column, value);
                }
                b"row" => {
                    in_row = false;
                    rows.push(std::mem::take(&mut row));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn start_cell(element: &BytesStart<'_>, next_column: usize) -> CellState {
    let mut cell = CellState {
        column: Some(next_column),
        ..CellState::default()
    };
    for attr in element.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"r" => cell.column = column_index(&value).or(cell.column),
            b"t" => {
                cell.kind = match value.as_ref() {
                    "s" => CellKind::Shared,
                    "inlineStr" => CellKind::Inline,
                    _ => CellKind::Raw,
                }
            }
            _ => {}
        }
    }
    cell
}

fn cell_value(kind: CellKind, raw: String, shared: &[String]) -> std::result::Result<String, String> {
    if kind != CellKind::Shared {
        return Ok(raw);
    }
    let index: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid shared string index '{raw}'"))?;
    shared
        .get(index)
        .cloned()
        .ok_or_else(|| format!("shared string index {index} out of range"))
}

fn place(row: &mut Vec<String>, column: Option<usize>, value: String) {
    let column = column.unwrap_or(row.len());
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
}

/// Zero-based column index from a cell reference such as `AB12`.
pub(crate) fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for letter in letters {
        index = index * 26 + usize::from(letter.to_ascii_uppercase() - b'A' + 1);
    }
    Some(index - 1)
}

fn push_text(out: &mut String, raw: &[u8]) -> std::result::Result<(), String> {
    let text = String::from_utf8_lossy(raw);
    let text = quick_xml::escape::unescape(&text).map_err(|e| e.to_string())?;
    out.push_str(&text);
    Ok(())
}

fn push_entity(out: &mut String, name: &[u8]) -> std::result::Result<(), String> {
    let name = String::from_utf8_lossy(name);
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        let ch = parsed
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid character reference '&{name};'"))?;
        out.push(ch);
        return Ok(());
    }
    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
        .ok_or_else(|| format!("unknown entity '&{name};'"))?;
    out.push_str(resolved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn workbook(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>OLD Item-variant</t></si>
<si><t>Ean no.</t></si>
<si><r><t>Lounge </t></r><r><t>Chair &amp; Ottoman</t></r></si>
<si><t xml:space="preserve"> MTO-1 </t><rPh><t>ignored</t></rPh></si>
</sst>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Description</t></is></c></row>
<row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2"><v>5712345000013</v></c><c r="C2" t="s"><v>2</v></c></row>
<row r="3"><c r="A3" t="str"><v>MTO-2</v></c><c r="C3" t="inlineStr"><is><t>Sofa &#x26; bed</t></is></c></row>
</sheetData>
</worksheet>"#;

    #[test]
    fn reads_shared_inline_and_raw_cells() {
        let bytes = workbook(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        let grid = read_workbook(&bytes, "book.xlsx").unwrap();
        assert_eq!(grid[0], vec!["OLD Item-variant", "Ean no.", "Description"]);
        assert_eq!(grid[1], vec![" MTO-1 ", "5712345000013", "Lounge Chair & Ottoman"]);
        assert_eq!(grid[2], vec!["MTO-2", "", "Sofa & bed"]);
    }

    #[test]
    fn picks_lowest_numbered_sheet() {
        let other = SHEET.replace("MTO-2", "OTHER");
        let bytes = workbook(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet2.xml", other.as_str()),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        let grid = read_workbook(&bytes, "book.xlsx").unwrap();
        assert_eq!(grid[2][0], "MTO-2");
    }

    #[test]
    fn workbook_without_sheets_is_parse_error() {
        let bytes = workbook(&[("xl/workbook.xml", "<workbook/>")]);
        let err = read_workbook(&bytes, "book.xlsx").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn garbage_is_parse_error() {
        let err = read_workbook(b"not a zip", "book.xlsx").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn column_references() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("12"), None);
    }
}
