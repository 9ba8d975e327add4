use crate::error::PriceSheetError;
use crate::helpers::archive::ArchiveHelper;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use zip::ZipArchive;

const MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
const SPACE: QName = QName(b"text:s");
const TAB: QName = QName(b"text:tab");
const LINE_BREAK: QName = QName(b"text:line-break");
const FILE_ENTRY: QName = QName(b"manifest:file-entry");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// OpenDocument spreadsheet (.ods).
pub(crate) struct OdsSpreadsheet {
    name: String,
    zip: ZipArchive<UnifiedReader>,
}

impl OdsSpreadsheet {
    pub(crate) fn open(file_name: &str) -> Result<Self, PriceSheetError> {
        let reader = UnifiedReader::new(file_name)?;
        let mut zip = ZipArchive::new(reader)?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: file_name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> &str {
        &self.name
    }

    /// All tables live in `content.xml`, so the part is scanned once and the
    /// first accepted table holding a value is returned.
    fn read_first_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, PriceSheetError> {
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;

        let mut sheet = None::<Sheet>;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_repeat = 1usize;
        let mut col_repeat = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut text_context = false;
        let mut paragraph_context = false;
        let mut annotation_context = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                sheet = Some(Sheet::new(&table_name)).filter(|_| criteria.accept(&table_name));
                row = 0;
            }
            Event::End(event) if event.name() == TABLE => {
                if let Some(table) = sheet.take().filter(|table| !table.is_empty()) {
                    return Ok(Some(table));
                }
            }
            Event::Start(event) if sheet.is_some() && event.name() == TABLE_ROW => {
                row_repeat = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if sheet.is_some() && event.name() == TABLE_ROW => row += row_repeat,
            Event::Start(event) if sheet.is_some() && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
                value.clear();
                col_repeat = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                (kind, text_context) = match value_type.as_deref() {
                    Some("string") => {
                        let is_error = event
                            .get_attribute_value("calcext:value-type")?
                            .map(|value_type| value_type == "error")
                            .unwrap_or(false);
                        match event.get_attribute_value("office:string-value")? {
                            Some(string) => {
                                value.push_str(&string);
                                (CellType::Text, false)
                            }
                            None if is_error => (CellType::Error, true),
                            None => (CellType::Text, true),
                        }
                    }
                    Some("boolean") => {
                        let is_true = event
                            .get_attribute_value("office:boolean-value")?
                            .map(|boolean| boolean != "false" && boolean != "0")
                            .unwrap_or(false);
                        value.push(if is_true { '1' } else { '0' });
                        (CellType::Boolean, false)
                    }
                    Some("date") => {
                        if let Some(date) = event.get_attribute_value("office:date-value")? {
                            value.push_str(&date);
                        }
                        (CellType::IsoDateTime, false)
                    }
                    Some("time") => {
                        if let Some(time) = event.get_attribute_value("office:time-value")? {
                            value.push_str(&time);
                        }
                        (CellType::IsoDuration, false)
                    }
                    Some(_) => {
                        if let Some(number) = event.get_attribute_value("office:value")? {
                            value.push_str(&number);
                        }
                        (CellType::Number, false)
                    }
                    None => (CellType::Empty, false),
                };
            }
            Event::End(event) if sheet.is_some() && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
                if let Some(table) = sheet.as_mut() {
                    if kind != CellType::Empty && !value.is_empty() {
                        for row_offset in 0..row_repeat {
                            for col_offset in 0..col_repeat {
                                table.push(Cell {
                                    row: row + row_offset,
                                    col: col + col_offset,
                                    kind,
                                    value: value.to_owned(),
                                });
                            }
                        }
                    }
                }
                col += col_repeat;
                text_context = false;
                paragraph_context = false;
                annotation_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => annotation_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => annotation_context = false,
            Event::Start(event) if text_context && !annotation_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
                paragraph_context = true;
            }
            Event::End(event) if text_context && !annotation_context && event.name() == PARAGRAPH => paragraph_context = false,
            Event::Start(event) if paragraph_context && !annotation_context && event.name() == SPACE => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.push_str(&" ".repeat(count));
            }
            Event::Start(event) if paragraph_context && !annotation_context && event.name() == TAB => value.push('\t'),
            Event::Start(event) if paragraph_context && !annotation_context && event.name() == LINE_BREAK => value.push('\n'),
            Event::Text(event) if paragraph_context && !annotation_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if paragraph_context && !annotation_context => value.push_bytes_ref(&event)?,
        });
        Ok(None)
    }
}

/// Fails unless the `mimetype` part, when present, names a spreadsheet.
fn check_mime(zip: &mut ZipArchive<UnifiedReader>) -> Result<(), PriceSheetError> {
    if let Some(mut part) = zip.part("mimetype")? {
        let mut mime_type = String::new();
        part.read_to_string(&mut mime_type)?;
        if mime_type.trim() != MIME_TYPE {
            Err(SpreadsheetError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Encrypted entries carry `encryption-data` in the manifest.
fn is_password_protected(zip: &mut ZipArchive<UnifiedReader>) -> Result<bool, PriceSheetError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}
