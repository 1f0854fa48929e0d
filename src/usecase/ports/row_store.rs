use crate::domain::entities::grid::{BatchRequest, SheetError};
use crate::domain::entities::sheet::{Record, SheetData, SheetId, SheetMeta};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("{0}")]
    Backend(String),
}

/// The spreadsheet behind every action. Sheets are addressed by name,
/// except in batch requests which carry a sheet id.
pub trait RowStore: Send + Sync {
    fn init(&self) -> Result<(), StoreError>;

    fn list_sheets(&self) -> Result<Vec<SheetMeta>, StoreError>;
    /// All rows, header first. A sheet that does not exist reads as empty.
    fn sheet_data(&self, sheet: &str) -> Result<SheetData, StoreError>;
    /// Creates the sheet when it does not exist yet.
    fn sheet_id(&self, sheet: &str) -> Result<SheetId, StoreError>;

    fn append_row(&self, sheet: &str, record: &Record) -> Result<(), StoreError>;
    /// Writes `headers` as the header row only when the sheet is empty.
    fn ensure_headers(&self, sheet: &str, headers: &[&str]) -> Result<bool, StoreError>;

    fn add_column(&self, sheet: &str, header: &str) -> Result<(), StoreError>;
    fn rename_column(&self, sheet: &str, old: &str, new: &str) -> Result<(), StoreError>;
    fn delete_column(&self, sheet: &str, header: &str) -> Result<(), StoreError>;

    /// Applies every request in order, or none of them.
    fn batch_update(&self, requests: &[BatchRequest]) -> Result<(), StoreError>;
}
