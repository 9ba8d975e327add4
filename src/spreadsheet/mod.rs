//! Workbook readers that turn .xlsx and .ods files into grids of cell text.

pub(crate) mod cell;
pub(crate) mod criteria;
pub mod grid;
pub(crate) mod ods;
pub(crate) mod reference;
pub mod sheet;
pub(crate) mod xlsx;

use crate::error::PriceSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet format: '{0}'")]
    FileFormatError(String),

    #[error("Missing part '{0}' in spreadsheet package")]
    FileError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' has no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Shared string {1} referenced by cell {0} not found")]
    SharedStringError(String, usize),

    #[error("Invalid OpenDocument MIME type")]
    MimeTypeError,
}

pub(crate) trait Spreadsheet {
    fn name(&self) -> &str;

    /// Loads the first sheet, in workbook order, that is accepted by the
    /// criteria and has at least one non-empty cell.
    fn read_first_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, PriceSheetError>;
}

/// Opens a workbook, choosing the reader from the file extension.
/// Remote sources use the extension of their URL path.
pub(crate) fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, PriceSheetError> {
    let path = if UnifiedReader::is_remote_url(file_name) {
        Url::parse(file_name)
            .map(|url| url.path().to_owned())
            .unwrap_or_else(|_| file_name.to_owned())
    } else {
        file_name.to_owned()
    };
    let extension = Path::new(&path)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") | Some("xlam") => Ok(Box::new(XlsxSpreadsheet::open(file_name)?)),
        Some("ods") => Ok(Box::new(OdsSpreadsheet::open(file_name)?)),
        _ => Err(SpreadsheetError::FileFormatError(file_name.to_owned()))?,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Writes a zip package with the given parts to a unique file in the temp directory.
    pub(crate) fn write_package(extension: &str, parts: &[(&str, &str)]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("price_sheet_{}.{}", uuid::Uuid::new_v4(), extension));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn rejects_unknown_extensions() {
        let result = open_spreadsheet("prices.csv");
        assert!(matches!(
            result,
            Err(PriceSheetError::SpreadsheetError(SpreadsheetError::FileFormatError(_)))
        ));
    }

    #[test]
    fn reports_missing_files() {
        let result = open_spreadsheet("missing_price_list.xlsx");
        assert!(matches!(result, Err(PriceSheetError::IoError(_))));
    }
}
