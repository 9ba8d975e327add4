use crate::error::PriceSheetError;
use crate::import::decimal::parse_decimal;
use crate::import::header::HeaderLayout;
use crate::import::CancellationToken;
use crate::spreadsheet::grid::GridSource;
use bigdecimal::BigDecimal;

/// Consecutive fully blank rows that end a table.
pub const BLANK_ROWS_TO_STOP: usize = 5;

/// One non-blank row read below the header. Blank text is `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewRow {
    pub code: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
}

impl PreviewRow {
    fn is_blank(&self) -> bool {
        self.code.is_none() && self.description.is_none() && self.price.is_none()
    }
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_owned())
    }
}

/// Reads rows from below the header up to `last_row`.
///
/// Fully blank rows are skipped, and `BLANK_ROWS_TO_STOP` of them in a row end
/// the table. With `max_rows` set, reading stops once that many rows were read.
pub fn extract_rows<G: GridSource + ?Sized>(
    grid: &G,
    layout: &HeaderLayout,
    last_row: usize,
    max_rows: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<PreviewRow>, PriceSheetError> {
    let mut rows = Vec::new();
    let mut blank_rows = 0usize;
    for row in layout.header_row + 1..=last_row {
        if max_rows.is_some_and(|max_rows| rows.len() >= max_rows) {
            tracing::debug!("Stopped at row {} after reading {} rows", row, rows.len());
            break;
        }
        cancel.check()?;

        let preview = PreviewRow {
            code: non_blank(grid.cell_text(row, layout.code_column)),
            description: non_blank(grid.cell_text(row, layout.description_column)),
            price: parse_decimal(&grid.cell_text(row, layout.price_column)),
        };
        if preview.is_blank() {
            blank_rows += 1;
            if blank_rows >= BLANK_ROWS_TO_STOP {
                tracing::debug!("Table ends at row {} after {} blank rows", row, blank_rows);
                break;
            }
            continue;
        }

        blank_rows = 0;
        rows.push(preview);
    }
    Ok(rows)
}
