use serde::{Deserialize, Serialize};

use crate::domain::entities::sheet::{header_index, Record, SheetId, SheetRow};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SheetError {
    #[error("sheet {0} does not exist")]
    UnknownSheet(SheetId),
    #[error("column \"{0}\" not found")]
    ColumnNotFound(String),
    #[error("empty or inverted range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    #[error("range {start}..{end} is outside the sheet ({len} {dimension})")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
        dimension: Dimension,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Rows,
    Columns,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Rows => write!(f, "rows"),
            Dimension::Columns => write!(f, "columns"),
        }
    }
}

/// Half-open cell rectangle in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRange {
    pub sheet_id: SheetId,
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl GridRange {
    pub fn cell(sheet_id: SheetId, row: usize, col: usize) -> Self {
        Self {
            sheet_id,
            start_row: row,
            end_row: row + 1,
            start_col: col,
            end_col: col + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchRequest {
    UpdateCells {
        range: GridRange,
        value: String,
    },
    DeleteDimension {
        sheet_id: SheetId,
        dimension: Dimension,
        start: usize,
        end: usize,
    },
    InsertDimension {
        sheet_id: SheetId,
        dimension: Dimension,
        start: usize,
        end: usize,
    },
}

impl BatchRequest {
    pub fn set_cell(sheet_id: SheetId, row: SheetRow, col: usize, value: impl Into<String>) -> Self {
        BatchRequest::UpdateCells {
            range: GridRange::cell(sheet_id, row.grid_index(), col),
            value: value.into(),
        }
    }

    pub fn delete_row(sheet_id: SheetId, row: SheetRow) -> Self {
        let start = row.grid_index();
        BatchRequest::DeleteDimension {
            sheet_id,
            dimension: Dimension::Rows,
            start,
            end: start + 1,
        }
    }

    pub fn sheet_id(&self) -> SheetId {
        match self {
            BatchRequest::UpdateCells { range, .. } => range.sheet_id,
            BatchRequest::DeleteDimension { sheet_id, .. }
            | BatchRequest::InsertDimension { sheet_id, .. } => *sheet_id,
        }
    }
}

/// Rectangular in-memory copy of one sheet. Every mutation keeps all rows
/// the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self { rows, width };
        grid.pad();
        grid
    }

    pub fn with_shape(height: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![String::new(); width]; height],
            width,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn headers(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if col >= self.width {
            self.width = col + 1;
            self.pad();
        }
        if row >= self.rows.len() {
            let width = self.width;
            self.rows.resize_with(row + 1, || vec![String::new(); width]);
        }
        self.rows[row][col] = value.into();
    }

    /// Appends `header` at the right edge and returns its column index.
    pub fn add_column(&mut self, header: &str) -> usize {
        let col = self.width;
        self.set(0, col, header);
        col
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<(), SheetError> {
        let col = header_index(self.headers(), old)
            .ok_or_else(|| SheetError::ColumnNotFound(old.to_string()))?;
        self.rows[0][col] = new.to_string();
        Ok(())
    }

    pub fn delete_column(&mut self, header: &str) -> Result<(), SheetError> {
        let col = header_index(self.headers(), header)
            .ok_or_else(|| SheetError::ColumnNotFound(header.to_string()))?;
        self.delete(Dimension::Columns, col, col + 1)
    }

    /// Writes the header row when the grid is empty. Returns whether it did.
    pub fn ensure_headers(&mut self, headers: &[&str]) -> bool {
        if !self.rows.is_empty() {
            return false;
        }
        for (col, header) in headers.iter().enumerate() {
            self.set(0, col, *header);
        }
        true
    }

    /// Appends one data row, creating the header row or missing columns first.
    pub fn append_record(&mut self, record: &Record) -> SheetRow {
        if self.rows.is_empty() {
            for (col, header) in record.headers().enumerate() {
                self.set(0, col, header);
            }
        }
        let row = self.rows.len();
        for (header, value) in record.iter() {
            let col = match header_index(self.headers(), header) {
                Some(col) => col,
                None => self.add_column(header),
            };
            self.set(row, col, value);
        }
        if self.rows.len() == row {
            self.rows.push(vec![String::new(); self.width]);
        }
        SheetRow::from_grid_index(row)
    }

    /// Applies one batch request, ignoring its sheet id.
    pub fn apply(&mut self, request: &BatchRequest) -> Result<(), SheetError> {
        match request {
            BatchRequest::UpdateCells { range, value } => {
                check_range(range.start_row, range.end_row)?;
                check_range(range.start_col, range.end_col)?;
                for row in range.start_row..range.end_row {
                    for col in range.start_col..range.end_col {
                        self.set(row, col, value.clone());
                    }
                }
                Ok(())
            }
            BatchRequest::DeleteDimension {
                dimension,
                start,
                end,
                ..
            } => self.delete(*dimension, *start, *end),
            BatchRequest::InsertDimension {
                dimension,
                start,
                end,
                ..
            } => self.insert(*dimension, *start, *end),
        }
    }

    fn delete(&mut self, dimension: Dimension, start: usize, end: usize) -> Result<(), SheetError> {
        check_range(start, end)?;
        let len = self.len(dimension);
        if start >= len {
            return Err(SheetError::OutOfBounds {
                start,
                end,
                len,
                dimension,
            });
        }
        let end = end.min(len);
        match dimension {
            Dimension::Rows => {
                self.rows.drain(start..end);
            }
            Dimension::Columns => {
                for row in &mut self.rows {
                    row.drain(start..end);
                }
                self.width -= end - start;
            }
        }
        Ok(())
    }

    fn insert(&mut self, dimension: Dimension, start: usize, end: usize) -> Result<(), SheetError> {
        check_range(start, end)?;
        let len = self.len(dimension);
        if start > len {
            return Err(SheetError::OutOfBounds {
                start,
                end,
                len,
                dimension,
            });
        }
        let count = end - start;
        match dimension {
            Dimension::Rows => {
                let blank = vec![String::new(); self.width];
                self.rows
                    .splice(start..start, std::iter::repeat(blank).take(count));
            }
            Dimension::Columns => {
                for row in &mut self.rows {
                    row.splice(start..start, std::iter::repeat(String::new()).take(count));
                }
                self.width += count;
            }
        }
        Ok(())
    }

    fn len(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Rows => self.rows.len(),
            Dimension::Columns => self.width,
        }
    }

    fn pad(&mut self) {
        let width = self.width;
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }
}

fn check_range(start: usize, end: usize) -> Result<(), SheetError> {
    if start >= end {
        return Err(SheetError::InvalidRange { start, end });
    }
    Ok(())
}
