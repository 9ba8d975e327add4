use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::grid::GridSource;
use crate::spreadsheet::grid::UsedRegion;
use std::collections::HashMap;

/// A worksheet loaded from a workbook file.
/// Only non-empty cells are stored, keyed by 0-based `(row, col)`.
#[derive(Debug)]
pub struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    cells: HashMap<(usize, usize), Cell>,
    /// Used bounds, 0-based: first row, first column, last row, last column
    bounds: Option<(usize, usize, usize, usize)>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: HashMap::new(),
            bounds: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell, replacing any previous cell at the same position.
    pub(crate) fn push(&mut self, cell: Cell) {
        let (row, col) = (cell.row, cell.col);
        self.bounds = Some(match self.bounds {
            None => (row, col, row, col),
            Some((first_row, first_col, last_row, last_col)) => (
                first_row.min(row),
                first_col.min(col),
                last_row.max(row),
                last_col.max(col),
            ),
        });
        self.cells.insert((row, col), cell);
    }

    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }
}

impl GridSource for Sheet {
    fn used_region(&self) -> Option<UsedRegion> {
        self.bounds
            .map(|(first_row, first_col, last_row, last_col)| UsedRegion {
                first_row: first_row + 1,
                first_column: first_col + 1,
                last_row: last_row + 1,
                last_column: last_col + 1,
            })
    }

    fn cell_text(&self, row: usize, column: usize) -> String {
        row.checked_sub(1)
            .zip(column.checked_sub(1))
            .and_then(|(row, col)| self.cell(row, col))
            .map(Cell::text)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn text(row: usize, col: usize, value: &str) -> Cell {
        Cell {
            row,
            col,
            kind: CellType::Text,
            value: value.to_owned(),
        }
    }

    #[test]
    fn tracks_used_region() {
        let mut sheet = Sheet::new("Precios");
        assert!(sheet.is_empty());
        assert_eq!(sheet.used_region(), None);

        sheet.push(text(3, 2, "Cable"));
        sheet.push(text(1, 4, "Precio"));
        assert_eq!(
            sheet.used_region(),
            Some(UsedRegion {
                first_row: 2,
                first_column: 3,
                last_row: 4,
                last_column: 5,
            })
        );
    }

    #[test]
    fn cell_text_renders_stored_cells() {
        let mut sheet = Sheet::new("Precios");
        sheet.push(text(0, 0, "Código"));
        sheet.push(Cell {
            row: 1,
            col: 0,
            kind: CellType::Number,
            value: "12.5".to_owned(),
        });
        assert_eq!(sheet.name(), "Precios");
        assert_eq!(sheet.cell_text(1, 1), "Código");
        assert_eq!(sheet.cell_text(2, 1), "12.5");
        assert_eq!(sheet.cell_text(2, 2), "");
        assert_eq!(sheet.cell_text(0, 0), "");
    }
}
