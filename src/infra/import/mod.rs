pub mod csv;
pub mod xlsx;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub sheet_id: i64,
    pub sheet_name: String,
    pub row_count: i64,
}
