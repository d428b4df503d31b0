//! Single-sheet Office Open XML workbook writer.
//!
//! Cells are written as inline strings so no shared-string table is needed.
//! Null cells are omitted, which spreadsheet applications show as empty.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use polars::prelude::DataFrame;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{OutputError, Result};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Style index of the bold header cells.
const HEADER_STYLE: &str = "1";
const MAX_SHEET_NAME_LEN: usize = 31;

/// Make `name` acceptable as a worksheet name.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Serialize `df` as a one-sheet workbook. Every column is written as text.
pub fn write_xlsx(df: &DataFrame, sheet_name: &str) -> Result<Vec<u8>> {
    let sheet_xml = sheet_xml(df)?;
    let workbook_xml = workbook_xml(&sanitize_sheet_name(sheet_name))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", &workbook_xml),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet_xml),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).map_err(OutputError::encode)?;
        zip.write_all(body).map_err(OutputError::encode)?;
    }
    let cursor = zip.finish().map_err(OutputError::encode)?;
    Ok(cursor.into_inner())
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(OutputError::encode)?;

    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("xmlns:r", REL_NS));
    xml.write_event(Event::Start(root)).map_err(OutputError::encode)?;
    xml.write_event(Event::Start(BytesStart::new("sheets")))
        .map_err(OutputError::encode)?;

    let mut sheet = BytesStart::new("sheet");
    sheet.push_attribute(("name", sheet_name));
    sheet.push_attribute(("sheetId", "1"));
    sheet.push_attribute(("r:id", "rId1"));
    xml.write_event(Event::Empty(sheet)).map_err(OutputError::encode)?;

    xml.write_event(Event::End(BytesEnd::new("sheets")))
        .map_err(OutputError::encode)?;
    xml.write_event(Event::End(BytesEnd::new("workbook")))
        .map_err(OutputError::encode)?;
    Ok(xml.into_inner())
}

fn sheet_xml(df: &DataFrame) -> Result<Vec<u8>> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        columns.push(column.cast(&polars::prelude::DataType::String)?);
    }
    let mut values = Vec::with_capacity(columns.len());
    for column in &columns {
        values.push(column.str()?);
    }

    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(OutputError::encode)?;
    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("xmlns:r", REL_NS));
    xml.write_event(Event::Start(root)).map_err(OutputError::encode)?;
    xml.write_event(Event::Start(BytesStart::new("sheetData")))
        .map_err(OutputError::encode)?;

    let headers: Vec<Option<&str>> = df
        .get_column_names()
        .into_iter()
        .map(|name| Some(name.as_str()))
        .collect();
    write_row(&mut xml, 1, &headers, Some(HEADER_STYLE))?;

    for row_idx in 0..df.height() {
        let cells: Vec<Option<&str>> = values.iter().map(|ca| ca.get(row_idx)).collect();
        write_row(&mut xml, row_idx + 2, &cells, None)?;
    }

    xml.write_event(Event::End(BytesEnd::new("sheetData")))
        .map_err(OutputError::encode)?;
    xml.write_event(Event::End(BytesEnd::new("worksheet")))
        .map_err(OutputError::encode)?;
    Ok(xml.into_inner())
}

fn write_row(
    xml: &mut Writer<Vec<u8>>,
    number: usize,
    cells: &[Option<&str>],
    style: Option<&str>,
) -> Result<()> {
    let number_text = number.to_string();
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", number_text.as_str()));
    xml.write_event(Event::Start(row)).map_err(OutputError::encode)?;

    for (col_idx, cell) in cells.iter().enumerate() {
        let Some(text) = cell.map(xml_text) else {
            continue;
        };
        let reference = format!("{}{number}", column_letters(col_idx));
        let mut c = BytesStart::new("c");
        c.push_attribute(("r", reference.as_str()));
        c.push_attribute(("t", "inlineStr"));
        if let Some(style) = style {
            c.push_attribute(("s", style));
        }
        xml.write_event(Event::Start(c)).map_err(OutputError::encode)?;
        xml.write_event(Event::Start(BytesStart::new("is")))
            .map_err(OutputError::encode)?;
        let mut t = BytesStart::new("t");
        if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            t.push_attribute(("xml:space", "preserve"));
        }
        xml.write_event(Event::Start(t)).map_err(OutputError::encode)?;
        xml.write_event(Event::Text(BytesText::new(&text)))
            .map_err(OutputError::encode)?;
        xml.write_event(Event::End(BytesEnd::new("t")))
            .map_err(OutputError::encode)?;
        xml.write_event(Event::End(BytesEnd::new("is")))
            .map_err(OutputError::encode)?;
        xml.write_event(Event::End(BytesEnd::new("c")))
            .map_err(OutputError::encode)?;
    }

    xml.write_event(Event::End(BytesEnd::new("row")))
        .map_err(OutputError::encode)?;
    Ok(())
}

/// Drop control characters that XML 1.0 does not allow in text.
fn xml_text(text: &str) -> Cow<'_, str> {
    let forbidden = |c: char| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r');
    if text.contains(forbidden) {
        Cow::Owned(text.chars().filter(|&c| !forbidden(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Spreadsheet column letters for a zero-based index: 0 -> A, 26 -> AA.
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn control_characters_are_dropped_from_cells() {
        assert_eq!(xml_text("Chair\u{1}\u{b}oak\u{1f}"), "Chairoak");
        assert_eq!(xml_text("tab\tand\nline"), "tab\tand\nline");
        assert!(matches!(xml_text("plain"), Cow::Borrowed("plain")));

        let df = polars::df! { "Description" => &["Sofa\u{0}\u{8}", "Lamp"] }.unwrap();
        let xml = String::from_utf8(sheet_xml(&df).unwrap()).unwrap();
        assert!(xml.contains("<t>Sofa</t>"));
        assert!(!xml.contains('\u{0}'));
        assert!(!xml.contains('\u{8}'));
    }

    #[test]
    fn sheet_names_follow_excel_rules() {
        assert_eq!(sanitize_sheet_name("Item Conversion"), "Item Conversion");
        assert_eq!(sanitize_sheet_name("a/b:c*d?"), "abcd");
        assert_eq!(sanitize_sheet_name("[]"), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }
}
