//! Rectangular grid abstraction consumed by the import pipeline.

/// Inclusive bounds of the used cells of a grid, 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UsedRegion {
    pub first_row: usize,
    pub first_column: usize,
    pub last_row: usize,
    pub last_column: usize,
}

/// Read-only cell access over a sheet of text.
///
/// Rows and columns are 1-based. `cell_text` returns an empty string for
/// empty cells and for positions outside the used region.
pub trait GridSource {
    /// Bounds of the used cells, or `None` when the grid has no data at all.
    fn used_region(&self) -> Option<UsedRegion>;

    fn cell_text(&self, row: usize, column: usize) -> String;
}

/// A grid held in memory as rows of text, with row 1 / column 1 at the top left.
#[derive(Clone, Debug, Default)]
pub struct MemoryGrid {
    rows: Vec<Vec<String>>,
    region: Option<UsedRegion>,
}

impl MemoryGrid {
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let mut region: Option<UsedRegion> = None;
        for (row_index, row) in rows.iter().enumerate() {
            for (column_index, text) in row.iter().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                let (row, column) = (row_index + 1, column_index + 1);
                region = Some(match region {
                    None => UsedRegion {
                        first_row: row,
                        first_column: column,
                        last_row: row,
                        last_column: column,
                    },
                    Some(bounds) => UsedRegion {
                        first_row: bounds.first_row.min(row),
                        first_column: bounds.first_column.min(column),
                        last_row: bounds.last_row.max(row),
                        last_column: bounds.last_column.max(column),
                    },
                });
            }
        }

        MemoryGrid { rows, region }
    }
}

impl GridSource for MemoryGrid {
    fn used_region(&self) -> Option<UsedRegion> {
        self.region
    }

    fn cell_text(&self, row: usize, column: usize) -> String {
        row.checked_sub(1)
            .zip(column.checked_sub(1))
            .and_then(|(row, column)| self.rows.get(row)?.get(column))
            .map(|text| text.to_owned())
            .unwrap_or_default()
    }
}
