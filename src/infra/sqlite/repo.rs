use std::path::PathBuf;

use tracing::debug;

use crate::domain::entities::grid::{BatchRequest, SheetError};
use crate::domain::entities::sheet::{Record, SheetData, SheetId, SheetMeta};
use crate::infra::sqlite::queries::{
    apply_batch, list_sheets, read_sheet, sheet_id_for, update_sheet,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::row_store::{RowStore, StoreError};

/// Workbook kept in a local SQLite file, one `sheet` row per tab.
pub struct SqliteRowStore {
    pub db_path: PathBuf,
}

impl SqliteRowStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Creates the schema before handing the store out.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(db_path);
        store.init()?;
        Ok(store)
    }
}

fn to_store_error(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<SheetError>() {
        Some(sheet_err) => StoreError::Sheet(sheet_err.clone()),
        None => StoreError::Backend(format!("{err:#}")),
    }
}

impl RowStore for SqliteRowStore {
    fn init(&self) -> Result<(), StoreError> {
        init_db(&self.db_path).map_err(to_store_error)
    }

    fn list_sheets(&self) -> Result<Vec<SheetMeta>, StoreError> {
        list_sheets(&self.db_path).map_err(to_store_error)
    }

    fn sheet_data(&self, sheet: &str) -> Result<SheetData, StoreError> {
        let grid = read_sheet(&self.db_path, sheet).map_err(to_store_error)?;
        Ok(SheetData::new(
            grid.map(|grid| grid.into_rows()).unwrap_or_default(),
        ))
    }

    fn sheet_id(&self, sheet: &str) -> Result<SheetId, StoreError> {
        sheet_id_for(&self.db_path, sheet)
            .map(SheetId)
            .map_err(to_store_error)
    }

    fn append_row(&self, sheet: &str, record: &Record) -> Result<(), StoreError> {
        let row = update_sheet(&self.db_path, sheet, |grid| Ok(grid.append_record(record)))
            .map_err(to_store_error)?;
        debug!(sheet, %row, "row appended");
        Ok(())
    }

    fn ensure_headers(&self, sheet: &str, headers: &[&str]) -> Result<bool, StoreError> {
        let written = update_sheet(&self.db_path, sheet, |grid| Ok(grid.ensure_headers(headers)))
            .map_err(to_store_error)?;
        if written {
            debug!(sheet, columns = headers.len(), "header row written");
        }
        Ok(written)
    }

    fn add_column(&self, sheet: &str, header: &str) -> Result<(), StoreError> {
        update_sheet(&self.db_path, sheet, |grid| {
            grid.add_column(header);
            Ok(())
        })
        .map_err(to_store_error)
    }

    fn rename_column(&self, sheet: &str, old: &str, new: &str) -> Result<(), StoreError> {
        update_sheet(&self.db_path, sheet, |grid| grid.rename_column(old, new))
            .map_err(to_store_error)
    }

    fn delete_column(&self, sheet: &str, header: &str) -> Result<(), StoreError> {
        update_sheet(&self.db_path, sheet, |grid| grid.delete_column(header))
            .map_err(to_store_error)
    }

    fn batch_update(&self, requests: &[BatchRequest]) -> Result<(), StoreError> {
        apply_batch(&self.db_path, requests).map_err(to_store_error)?;
        debug!(requests = requests.len(), "batch applied");
        Ok(())
    }
}
