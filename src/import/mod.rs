//! Spreadsheet to price rows pipeline.
//!
//! A workbook is opened, the first sheet with data is chosen, the header row
//! and the code, description and price columns are located, and the rows
//! below the header are read until a run of blank rows ends the table. For
//! committed imports the rows are then mapped into catalog entries carrying
//! the section they belong to.

pub mod decimal;
pub mod header;
pub mod rows;
pub mod section;

use crate::error::PriceSheetError;
use crate::import::header::locate_header;
use crate::import::rows::extract_rows;
use crate::import::rows::PreviewRow;
use crate::import::section::map_sections;
use crate::import::section::CatalogEntry;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::grid::GridSource;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::sheet::Sheet;
use glob::Pattern;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiserror::Error;

/// Rows shown by a preview when no other bound is given.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("A spreadsheet path or URL is required")]
    InputInvalid,

    #[error("Cannot read spreadsheet '{file_name}': {source}")]
    SourceUnavailable {
        file_name: String,
        #[source]
        source: Box<PriceSheetError>,
    },

    #[error("No sheet with data found in '{0}'")]
    NoTabularData(String),

    #[error("No header row found in rows {first_row}-{last_row}, columns {first_column}-{last_column}")]
    HeaderNotFound {
        first_row: usize,
        last_row: usize,
        first_column: usize,
        last_column: usize,
    },

    #[error("Import cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between a caller and a running import.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with `ImportError::Cancelled` once cancellation was requested.
    pub fn check(&self) -> Result<(), ImportError> {
        if self.is_cancelled() {
            Err(ImportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// How much of a workbook an import reads.
#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    /// Stop after this many rows; `None` reads the whole table.
    pub max_rows: Option<usize>,
    /// Only consider sheets whose name matches.
    pub sheet: Option<Pattern>,
}

impl ImportOptions {
    pub fn preview() -> Self {
        Self {
            max_rows: Some(DEFAULT_PREVIEW_ROWS),
            sheet: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: Option<Pattern>) -> Self {
        self.sheet = sheet;
        self
    }
}

/// Rows read from a sheet together with the positions they were read from.
/// Row and column numbers are 1-based.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportPreview {
    pub sheet_name: String,
    pub header_row: usize,
    pub code_column: usize,
    pub description_column: usize,
    pub price_column: usize,
    pub rows: Vec<PreviewRow>,
}

/// Opens `source` and previews its price table.
pub fn import_preview(
    source: &str,
    options: &ImportOptions,
    cancel: &CancellationToken,
) -> Result<ImportPreview, PriceSheetError> {
    let sheet = load_sheet(source, options, cancel)?;
    preview_grid(sheet.name(), &sheet, options.max_rows, cancel)
}

/// Locates the header of `grid` and reads the rows below it.
pub fn preview_grid<G: GridSource + ?Sized>(
    sheet_name: &str,
    grid: &G,
    max_rows: Option<usize>,
    cancel: &CancellationToken,
) -> Result<ImportPreview, PriceSheetError> {
    let region = grid
        .used_region()
        .ok_or_else(|| ImportError::NoTabularData(sheet_name.to_owned()))?;
    let layout = locate_header(grid, &region, cancel)?;
    let rows = extract_rows(grid, &layout, region.last_row, max_rows, cancel)?;
    tracing::debug!(
        "Previewed {} rows from sheet '{}' below header row {}",
        rows.len(),
        sheet_name,
        layout.header_row
    );

    Ok(ImportPreview {
        sheet_name: sheet_name.to_owned(),
        header_row: layout.header_row,
        code_column: layout.code_column,
        description_column: layout.description_column,
        price_column: layout.price_column,
        rows,
    })
}

/// Reads the whole price table of `source` and maps it into catalog entries.
pub fn load_catalog(
    source: &str,
    options: &ImportOptions,
    cancel: &CancellationToken,
) -> Result<Vec<CatalogEntry>, PriceSheetError> {
    let options = ImportOptions {
        max_rows: None,
        sheet: options.sheet.clone(),
    };
    let preview = import_preview(source, &options, cancel)?;
    let entries = map_sections(preview.rows);
    tracing::info!(
        "Loaded {} catalog entries from '{}' (sheet '{}')",
        entries.len(),
        source,
        preview.sheet_name
    );
    Ok(entries)
}

/// Opens the workbook and picks its first sheet with data.
/// The workbook is closed before returning, whatever the outcome.
fn load_sheet(source: &str, options: &ImportOptions, cancel: &CancellationToken) -> Result<Sheet, PriceSheetError> {
    let source = source.trim();
    if source.is_empty() {
        Err(ImportError::InputInvalid)?;
    }
    cancel.check()?;

    let unavailable = |error: PriceSheetError| ImportError::SourceUnavailable {
        file_name: source.to_owned(),
        source: Box::new(error),
    };
    let mut spreadsheet = open_spreadsheet(source).map_err(unavailable)?;
    let criteria = Criteria::new(options.sheet.clone());
    let sheet = spreadsheet.read_first_sheet(&criteria).map_err(unavailable)?;
    tracing::debug!("Opened spreadsheet '{}'", spreadsheet.name());

    sheet.ok_or_else(|| ImportError::NoTabularData(source.to_owned()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::grid::MemoryGrid;
    use crate::spreadsheet::tests::write_package;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn price_list_grid() -> MemoryGrid {
        MemoryGrid::from_rows(vec![
            vec!["Lista de precios 2024", "", ""],
            vec!["", "", ""],
            vec!["Código", "Descripción", "Precio"],
            vec!["", "Electrónica", ""],
            vec!["A-001", "Cable UTP", "1.234,56"],
            vec!["A-002", "Conector RJ45", "12.50"],
            vec!["", "Ferretería", "0"],
            vec!["B-001", "Tornillo", ""],
        ])
    }

    #[test]
    fn previews_a_grid() {
        let preview = preview_grid("Hoja1", &price_list_grid(), None, &CancellationToken::new()).unwrap();
        assert_eq!(preview.sheet_name, "Hoja1");
        assert_eq!(preview.header_row, 3);
        assert_eq!(preview.code_column, 1);
        assert_eq!(preview.description_column, 2);
        assert_eq!(preview.price_column, 3);
        assert_eq!(preview.rows.len(), 5);
        assert_eq!(preview.rows[1].code.as_deref(), Some("A-001"));
        assert_eq!(preview.rows[1].price, Some(decimal("1234.56")));
    }

    #[test]
    fn preview_is_bounded_by_max_rows() {
        let preview = preview_grid("Hoja1", &price_list_grid(), Some(2), &CancellationToken::new()).unwrap();
        assert_eq!(preview.rows.len(), 2);
    }

    #[test]
    fn previews_are_repeatable() {
        let grid = price_list_grid();
        let first = preview_grid("Hoja1", &grid, None, &CancellationToken::new()).unwrap();
        let second = preview_grid("Hoja1", &grid, None, &CancellationToken::new()).unwrap();
        assert_eq!(first, second);
        assert_eq!(map_sections(first.rows), map_sections(second.rows));
    }

    #[test]
    fn empty_grid_has_no_tabular_data() {
        let grid = MemoryGrid::from_rows(vec![vec!["", ""]]);
        let result = preview_grid("Hoja1", &grid, None, &CancellationToken::new());
        assert!(matches!(
            result,
            Err(PriceSheetError::ImportError(ImportError::NoTabularData(_)))
        ));
    }

    #[test]
    fn cancelled_preview_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = preview_grid("Hoja1", &price_list_grid(), None, &cancel);
        assert!(matches!(result, Err(PriceSheetError::ImportError(ImportError::Cancelled))));
    }

    #[test]
    fn cancellation_token_is_shared_between_clones() {
        let cancel = CancellationToken::new();
        let observer = cancel.clone();
        assert!(observer.check().is_ok());
        cancel.cancel();
        assert!(observer.is_cancelled());
        assert!(matches!(observer.check(), Err(ImportError::Cancelled)));
    }

    #[test]
    fn blank_source_is_invalid() {
        let result = import_preview("  ", &ImportOptions::preview(), &CancellationToken::new());
        assert!(matches!(result, Err(PriceSheetError::ImportError(ImportError::InputInvalid))));
    }

    #[test]
    fn missing_source_is_unavailable() {
        let result = import_preview("missing_price_list.xlsx", &ImportOptions::preview(), &CancellationToken::new());
        assert!(matches!(
            result,
            Err(PriceSheetError::ImportError(ImportError::SourceUnavailable { .. }))
        ));
    }

    #[test]
    fn cancelled_import_does_not_open_the_source() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = import_preview("missing_price_list.xlsx", &ImportOptions::preview(), &cancel);
        assert!(matches!(result, Err(PriceSheetError::ImportError(ImportError::Cancelled))));
    }

    #[test]
    fn preview_options() {
        assert_eq!(ImportOptions::preview().max_rows, Some(DEFAULT_PREVIEW_ROWS));
        assert_eq!(ImportOptions::unbounded().max_rows, None);
        let pattern = Pattern::new("Precios*").unwrap();
        let options = ImportOptions::preview().with_sheet(Some(pattern.clone()));
        assert_eq!(options.sheet, Some(pattern));
    }

    const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:spreadsheet>
<table:table table:name="Vacía"/>
<table:table table:name="Precios">
<table:table-row><table:table-cell office:value-type="string"><text:p>SKU</text:p></table:table-cell><table:table-cell office:value-type="string"><text:p>Detalle</text:p></table:table-cell><table:table-cell office:value-type="string"><text:p>P.V.P.</text:p></table:table-cell><table:table-cell office:value-type="string"><text:p>PVP €</text:p></table:table-cell></table:table-row>
<table:table-row><table:table-cell/><table:table-cell office:value-type="string"><text:p>Iluminación</text:p></table:table-cell></table:table-row>
<table:table-row><table:table-cell office:value-type="string"><text:p>L-10</text:p></table:table-cell><table:table-cell office:value-type="string"><text:p>Lámpara LED</text:p></table:table-cell><table:table-cell/><table:table-cell office:value-type="float" office:value="8.75"/></table:table-row>
<table:table-row table:number-rows-repeated="5"><table:table-cell table:number-columns-repeated="4"/></table:table-row>
<table:table-row><table:table-cell office:value-type="string"><text:p>Notas</text:p></table:table-cell><table:table-cell office:value-type="string"><text:p>Precios sin IVA</text:p></table:table-cell></table:table-row>
</table:table>
</office:spreadsheet></office:body></office:document-content>"#;

    #[test]
    fn loads_catalog_from_workbook() {
        let path = write_package(
            "ods",
            &[("mimetype", "application/vnd.oasis.opendocument.spreadsheet"), ("content.xml", CONTENT)],
        );
        let source = path.to_str().unwrap().to_owned();
        let preview = import_preview(&source, &ImportOptions::preview(), &CancellationToken::new());
        let entries = load_catalog(&source, &ImportOptions::preview(), &CancellationToken::new());
        std::fs::remove_file(path).unwrap();

        let preview = preview.unwrap();
        assert_eq!(preview.sheet_name, "Precios");
        assert_eq!((preview.header_row, preview.code_column), (1, 1));
        assert_eq!((preview.description_column, preview.price_column), (2, 4));
        assert_eq!(preview.rows.len(), 2);

        let entries = entries.unwrap();
        assert_eq!(
            entries,
            vec![CatalogEntry {
                description: "Lámpara LED".to_owned(),
                code: Some("L-10".to_owned()),
                unit_price: decimal("8.75"),
                section_name: Some("Iluminación".to_owned()),
            }]
        );
    }

    #[test]
    fn formula_prices_read_as_displayed() {
        let path = write_package(
            "xlsx",
            &[
                (
                    "xl/workbook.xml",
                    r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Hoja1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                ),
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
                ),
                (
                    "xl/worksheets/sheet1.xml",
                    r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Codigo</t></is></c><c r="B1" t="inlineStr"><is><t>Descripcion</t></is></c><c r="C1" t="inlineStr"><is><t>Precio</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>A-1</t></is></c><c r="B2" t="inlineStr"><is><t>Cable</t></is></c><c r="C2"><f>10.1666*1.21</f><v>12.300000000000001</v></c></row>
</sheetData></worksheet>"#,
                ),
            ],
        );
        let preview = import_preview(path.to_str().unwrap(), &ImportOptions::preview(), &CancellationToken::new());
        std::fs::remove_file(path).unwrap();

        let preview = preview.unwrap();
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0].price, Some(decimal("12.3")));
        assert_eq!(preview.rows[0].price.as_ref().map(|price| price.to_string()), Some("12.3".to_owned()));
    }
}
