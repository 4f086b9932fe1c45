//! XLSX worksheet reader

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use cablebox_core::{CellAddress, CellValue, Sheet};

/// A worksheet entry from `xl/workbook.xml`, resolved to its part path
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    path: String,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read one worksheet from a file path.
    ///
    /// `sheet` selects a worksheet by name; `None` takes the first one in
    /// workbook order.
    pub fn read_file<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> XlsxResult<Sheet> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), sheet)
    }

    /// Read one worksheet from a reader
    pub fn read<R: Read + Seek>(reader: R, sheet: Option<&str>) -> XlsxResult<Sheet> {
        let mut archive = Self::open_archive(reader)?;
        let entries = Self::sheet_entries(&mut archive)?;

        let entry = match sheet {
            Some(name) => entries
                .iter()
                .find(|e| e.name == name)
                .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?,
            None => entries.first().ok_or(XlsxError::NoWorksheets)?,
        };
        log::debug!("reading worksheet '{}' from {}", entry.name, entry.path);

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let cells = Self::read_worksheet(&mut archive, &entry.path, &shared_strings)?;

        Ok(Sheet::from_records(entry.name.clone(), Self::into_records(cells)))
    }

    fn open_archive<R: Read + Seek>(reader: R) -> XlsxResult<zip::ZipArchive<R>> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Every OOXML package carries a content-types part
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        Ok(archive)
    }

    /// Worksheets from workbook.xml joined with their paths from workbook.xml.rels
    fn sheet_entries<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let sheets = Self::read_workbook_xml(archive)?;
        let paths = Self::read_workbook_rels(archive)?;

        let entries: Vec<SheetEntry> = sheets
            .into_iter()
            .filter_map(|(name, r_id)| {
                paths
                    .get(&r_id)
                    .map(|path| SheetEntry { name, path: path.clone() })
            })
            .collect();

        if entries.is_empty() {
            return Err(XlsxError::NoWorksheets);
        }
        Ok(entries)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs (<rPh>) repeat the text as a reading guide
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"r:id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get worksheet part paths by relationship id
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Relative targets hang off the xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read every valued cell of a worksheet part
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        shared_strings: &[String],
    ) -> XlsxResult<BTreeMap<CellAddress, CellValue>> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cells = BTreeMap::new();

        // Cells may omit `r`; positions then follow document order
        let mut row: u32 = 0;
        let mut next_col: u16 = 0;

        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        row = Self::row_index(&e).unwrap_or(row);
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::start(&e, row, next_col);
                        next_col = pending.addr.col.saturating_add(1);
                        cell = Some(pending);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"t" if cell.is_some() => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        row = Self::row_index(&e).unwrap_or(row).saturating_add(1);
                        next_col = 0;
                    }
                    // A self-closing cell carries style only
                    b"c" => {
                        next_col = PendingCell::start(&e, row, next_col)
                            .addr
                            .col
                            .saturating_add(1);
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Some(pending) = cell.as_mut() {
                        pending.text.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"v" => in_value = false,
                    b"t" => in_inline_text = false,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let addr = pending.addr;
                            let value = pending.finish(shared_strings)?;
                            if !value.is_empty() {
                                cells.insert(addr, value);
                            }
                        }
                    }
                    b"row" => row = row.saturating_add(1),
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(cells)
    }

    /// 0-based row index from a `<row r="…">` element
    fn row_index(e: &BytesStart) -> Option<u32> {
        attr_value(e, b"r")
            .and_then(|r| r.parse::<u32>().ok())
            .map(|r| r.saturating_sub(1))
    }

    /// Group sparse cells into dense records, one per populated row
    fn into_records(cells: BTreeMap<CellAddress, CellValue>) -> Vec<Vec<CellValue>> {
        let mut records: Vec<Vec<CellValue>> = Vec::new();
        let mut current_row: Option<u32> = None;

        for (addr, value) in cells {
            if current_row != Some(addr.row) {
                records.push(Vec::new());
                current_row = Some(addr.row);
            }
            if let Some(record) = records.last_mut() {
                let col = addr.col as usize;
                if record.len() <= col {
                    record.resize(col + 1, CellValue::Empty);
                }
                record[col] = value;
            }
        }

        records
    }
}

/// A `<c>` element being read
struct PendingCell {
    addr: CellAddress,
    cell_type: Option<String>,
    text: String,
}

impl PendingCell {
    fn start(e: &BytesStart, row: u32, next_col: u16) -> Self {
        let fallback = CellAddress::new(row, next_col);
        let addr = match attr_value(e, b"r") {
            Some(r) => CellAddress::parse(&r).unwrap_or_else(|err| {
                log::warn!("invalid cell reference '{}' ({}), using {}", r, err, fallback);
                fallback
            }),
            None => fallback,
        };

        Self {
            addr,
            cell_type: attr_value(e, b"t"),
            text: String::new(),
        }
    }

    /// Turn the collected text into a value according to the cell type
    fn finish(self, shared_strings: &[String]) -> XlsxResult<CellValue> {
        let text = self.text;
        if text.is_empty() && self.cell_type.as_deref() != Some("inlineStr") {
            return Ok(CellValue::Empty);
        }

        let value = match self.cell_type.as_deref() {
            Some("s") => {
                let idx: usize = text.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", text))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::string(s.as_str())
            }
            Some("b") => CellValue::Boolean(text == "1" || text.eq_ignore_ascii_case("true")),
            Some("inlineStr") | Some("str") => CellValue::String(decode_excel_escapes(&text)),
            None | Some("n") => match text.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(text),
            },
            // Errors (`e`), ISO dates (`d`) and unknown types keep their text
            Some(_) => CellValue::String(text),
        };

        Ok(value)
    }
}

/// Unescaped value of an attribute, if present
fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
    const WORKBOOK: &str = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Notes" sheetId="1" r:id="rId1"/><sheet name="Boxes" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
    const RELS: &str = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

    fn build_xlsx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            for (name, body) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    fn workbook_with(sheet2: &str, shared: &str) -> Vec<u8> {
        build_xlsx(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", shared),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>notes</t></is></c></row></sheetData></worksheet>"#,
            ),
            ("xl/worksheets/sheet2.xml", sheet2),
        ])
    }

    #[test]
    fn test_reads_first_sheet_by_default() {
        let data = workbook_with("<worksheet><sheetData/></worksheet>", "<sst/>");
        let sheet = XlsxReader::read(Cursor::new(data), None).unwrap();

        assert_eq!(sheet.name(), "Notes");
        assert_eq!(sheet.headers(), &["notes"]);
    }

    #[test]
    fn test_reads_named_sheet_with_shared_strings() {
        let shared = r#"<sst><si><t> 迴路盒編號 </t></si><si><t>數量</t></si><si><r><t>AV </t></r><r><t>04-01</t></r><rPh><t>ignored</t></rPh></si><si><t>Rack 3_x000a_Shelf B</t></si></sst>"#;
        let sheet2 = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row>
            <row r="3"><c r="A3" t="s"><v>2</v></c><c r="B3" t="s"><v>3</v></c><c r="C3"><v>2</v></c><c r="D3" s="4"/></row>
        </sheetData></worksheet>"#;
        let data = workbook_with(sheet2, shared);

        let sheet = XlsxReader::read(Cursor::new(data), Some("Boxes")).unwrap();

        assert_eq!(sheet.headers(), &["迴路盒編號", "", "數量"]);
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.value(0, 0), &CellValue::string("AV 04-01"));
        assert_eq!(sheet.value(0, 1), &CellValue::string("Rack 3\nShelf B"));
        assert_eq!(sheet.value(0, 2), &CellValue::Number(2.0));
        assert_eq!(sheet.value(0, 3), &CellValue::Empty);
    }

    #[test]
    fn test_cell_types() {
        let sheet2 = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="str"><v>h</v></c></row>
            <row r="2"><c r="A2" t="b"><v>1</v></c><c r="B2" t="e"><v>#N/A</v></c><c r="C2" t="str"><f>A1</f><v>cached</v></c><c r="D2"><v>1.5</v></c></row>
        </sheetData></worksheet>"#;
        let data = workbook_with(sheet2, "<sst/>");

        let sheet = XlsxReader::read(Cursor::new(data), Some("Boxes")).unwrap();

        assert_eq!(
            sheet.rows()[0],
            vec![
                CellValue::Boolean(true),
                CellValue::string("#N/A"),
                CellValue::string("cached"),
                CellValue::Number(1.5),
            ]
        );
    }

    #[test]
    fn test_cells_without_references_follow_document_order() {
        let sheet2 = r#"<worksheet><sheetData>
            <row><c t="inlineStr"><is><t>Box ID</t></is></c><c t="inlineStr"><is><t>Count</t></is></c></row>
            <row><c t="inlineStr"><is><t>0401</t></is></c><c><v>3</v></c></row>
        </sheetData></worksheet>"#;
        let data = workbook_with(sheet2, "<sst/>");

        let sheet = XlsxReader::read(Cursor::new(data), Some("Boxes")).unwrap();

        assert_eq!(sheet.headers(), &["Box ID", "Count"]);
        assert_eq!(sheet.value(0, 0), &CellValue::string("0401"));
        assert_eq!(sheet.value(0, 1), &CellValue::Number(3.0));
    }

    #[test]
    fn test_missing_sheet_name() {
        let data = workbook_with("<worksheet/>", "<sst/>");
        let err = XlsxReader::read(Cursor::new(data), Some("Nope")).unwrap_err();
        assert!(matches!(err, XlsxError::SheetNotFound(name) if name == "Nope"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = XlsxReader::read(Cursor::new(b"Box ID,Count\n".to_vec()), None).unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }

    #[test]
    fn test_missing_content_types() {
        let data = build_xlsx(&[("xl/workbook.xml", WORKBOOK)]);
        let err = XlsxReader::read(Cursor::new(data), None).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidFormat(_)));
    }
}
