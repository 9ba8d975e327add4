use crate::error::PriceSheetError;
use crate::import::CancellationToken;
use crate::import::ImportError;
use crate::spreadsheet::grid::GridSource;
use crate::spreadsheet::grid::UsedRegion;
use unicode_normalization::UnicodeNormalization;

/// Rows scanned for a header, counted from the first used row.
pub const HEADER_SEARCH_ROWS: usize = 100;
/// Columns scanned for a header, counted from the first used column.
pub const HEADER_SEARCH_COLUMNS: usize = 30;

const CODE_KEYWORDS: [&str; 3] = ["COD", "CODIGO", "SKU"];
const DESCRIPTION_KEYWORDS: [&str; 3] = ["DESCRIP", "DESCRIPCION", "DETALLE"];
const PRICE_KEYWORDS: [&str; 4] = ["PRECIO", "PVP", "PRICE", "$"];

/// Header row and data columns of a price table, 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeaderLayout {
    pub header_row: usize,
    pub code_column: usize,
    pub description_column: usize,
    pub price_column: usize,
}

/// First column of a row matching each role.
#[derive(Default)]
struct RowMatch {
    code: Option<usize>,
    description: Option<usize>,
    price: Option<usize>,
}

impl RowMatch {
    fn record(&mut self, column: usize, header: &str) {
        if self.code.is_none() && contains_keyword(header, &CODE_KEYWORDS) {
            self.code = Some(column);
        }
        if self.description.is_none() && contains_keyword(header, &DESCRIPTION_KEYWORDS) {
            self.description = Some(column);
        }
        if self.price.is_none() && contains_keyword(header, &PRICE_KEYWORDS) {
            self.price = Some(column);
        }
    }

    fn is_header(&self) -> bool {
        self.description.is_some() && (self.code.is_some() || self.price.is_some())
    }
}

/// Upper-cases and strips diacritics, so `Código` and `CODIGO` compare equal.
pub fn normalize_header(text: &str) -> String {
    text.trim()
        .to_uppercase()
        .nfd()
        .filter(|character| !unicode_normalization::char::is_combining_mark(*character))
        .collect()
}

fn contains_keyword(header: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| header.contains(keyword))
}

/// Finds the first row of the search window that names a description column
/// and at least a code or a price column.
///
/// A missing code column falls back to the first used column and a missing
/// price column to the column right of the description.
pub fn locate_header<G: GridSource + ?Sized>(
    grid: &G,
    region: &UsedRegion,
    cancel: &CancellationToken,
) -> Result<HeaderLayout, PriceSheetError> {
    let last_row = region.last_row.min(region.first_row + HEADER_SEARCH_ROWS - 1);
    let last_column = region.last_column.min(region.first_column + HEADER_SEARCH_COLUMNS - 1);

    for row in region.first_row..=last_row {
        cancel.check()?;

        let mut matched = RowMatch::default();
        for column in region.first_column..=last_column {
            let header = normalize_header(&grid.cell_text(row, column));
            if !header.is_empty() {
                matched.record(column, &header);
            }
        }

        if let Some(description_column) = matched.description.filter(|_| matched.is_header()) {
            let layout = HeaderLayout {
                header_row: row,
                code_column: matched.code.unwrap_or(region.first_column),
                description_column,
                price_column: matched.price.unwrap_or(description_column + 1),
            };
            tracing::debug!(
                "Header found at row {} (code column {}, description column {}, price column {})",
                layout.header_row,
                layout.code_column,
                layout.description_column,
                layout.price_column
            );
            return Ok(layout);
        }
    }

    Err(ImportError::HeaderNotFound {
        first_row: region.first_row,
        last_row,
        first_column: region.first_column,
        last_column,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::grid::MemoryGrid;

    fn locate(grid: &MemoryGrid) -> Result<HeaderLayout, PriceSheetError> {
        locate_header(grid, &grid.used_region().unwrap(), &CancellationToken::new())
    }

    #[test]
    fn folds_case_and_diacritics() {
        assert_eq!(normalize_header("  Código "), "CODIGO");
        assert_eq!(normalize_header("descripción"), "DESCRIPCION");
        assert_eq!(normalize_header("Precio unitario ($)"), "PRECIO UNITARIO ($)");
        assert_eq!(normalize_header("   "), "");
    }

    #[test]
    fn finds_header_with_all_columns() {
        let grid = MemoryGrid::from_rows(vec![
            vec!["Distribuidora Norte", "", ""],
            vec!["Descripción", "Código", "P.V.P"],
            vec!["Detalle", "Cód.", "PVP"],
        ]);
        // "P.V.P" matches no keyword, but the code column already qualifies row 2
        let layout = locate(&grid).unwrap();
        assert_eq!(
            layout,
            HeaderLayout {
                header_row: 2,
                code_column: 2,
                description_column: 1,
                price_column: 2,
            }
        );
    }

    #[test]
    fn first_qualifying_row_wins() {
        let grid = MemoryGrid::from_rows(vec![
            vec!["Descripción", "Precio", ""],
            vec!["Código", "Descripción", "Precio"],
        ]);
        let layout = locate(&grid).unwrap();
        assert_eq!(layout.header_row, 1);
        assert_eq!(layout.description_column, 1);
        assert_eq!(layout.price_column, 2);
    }

    #[test]
    fn first_matching_column_wins_within_a_row() {
        let grid = MemoryGrid::from_rows(vec![vec!["SKU", "Detalle", "Precio lista", "Precio oferta", "Código"]]);
        let layout = locate(&grid).unwrap();
        assert_eq!(layout.code_column, 1);
        assert_eq!(layout.description_column, 2);
        assert_eq!(layout.price_column, 3);
    }

    #[test]
    fn one_cell_can_serve_several_roles() {
        let grid = MemoryGrid::from_rows(vec![vec!["Código / Descripción", "Importe"]]);
        let layout = locate(&grid).unwrap();
        assert_eq!(layout.code_column, 1);
        assert_eq!(layout.description_column, 1);
        assert_eq!(layout.price_column, 2);
    }

    #[test]
    fn missing_columns_fall_back_to_positions() {
        let grid = MemoryGrid::from_rows(vec![
            vec!["", "", "Listado", ""],
            vec!["", "", "Descripción", "Precio"],
            vec!["", "Nota", "", ""],
        ]);
        let layout = locate(&grid).unwrap();
        assert_eq!(layout.header_row, 2);
        assert_eq!(layout.code_column, 2);
        assert_eq!(layout.price_column, 4);

        let grid = MemoryGrid::from_rows(vec![vec!["Cod", "Descripcion"]]);
        let layout = locate(&grid).unwrap();
        assert_eq!(layout.price_column, 3);
    }

    #[test]
    fn description_alone_is_not_a_header() {
        let grid = MemoryGrid::from_rows(vec![vec!["Descripción", "Cantidad"], vec!["Cable", "3"]]);
        let result = locate(&grid);
        assert!(matches!(
            result,
            Err(PriceSheetError::ImportError(ImportError::HeaderNotFound {
                first_row: 1,
                last_row: 2,
                first_column: 1,
                last_column: 2,
            }))
        ));
    }

    #[test]
    fn search_window_is_bounded() {
        let mut rows = vec![vec!["x".to_owned()]; HEADER_SEARCH_ROWS];
        rows.push(vec!["Código".to_owned(), "Descripción".to_owned()]);
        let grid = MemoryGrid::from_rows(rows);
        let result = locate(&grid);
        assert!(matches!(
            result,
            Err(PriceSheetError::ImportError(ImportError::HeaderNotFound { last_row: 100, .. }))
        ));

        let mut header = vec![String::new(); HEADER_SEARCH_COLUMNS];
        header[0] = "Código".to_owned();
        header.push("Descripción".to_owned());
        let grid = MemoryGrid::from_rows(vec![header]);
        let result = locate(&grid);
        assert!(matches!(
            result,
            Err(PriceSheetError::ImportError(ImportError::HeaderNotFound { last_column: 30, .. }))
        ));
    }

    #[test]
    fn cancellation_stops_the_scan() {
        let grid = MemoryGrid::from_rows(vec![vec!["Código", "Descripción"]]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = locate_header(&grid, &grid.used_region().unwrap(), &cancel);
        assert!(matches!(result, Err(PriceSheetError::ImportError(ImportError::Cancelled))));
    }
}
