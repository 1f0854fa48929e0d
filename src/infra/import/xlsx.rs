use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::info;

use crate::infra::import::ImportResult;
use crate::infra::sqlite::queries::replace_sheet;
use crate::infra::sqlite::schema::init_db;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Copies workbook tabs into sheets of the same name, replacing their
/// contents. An empty `sheets` list imports every tab.
pub fn import_xlsx_sheets(db_path: &Path, xlsx_path: &Path, sheets: &[String]) -> Result<Vec<ImportResult>> {
    init_db(db_path)?;

    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open xlsx: {}", xlsx_path.display()))?;

    let names = if sheets.is_empty() {
        workbook.sheet_names()
    } else {
        sheets.to_vec()
    };

    let mut imported = Vec::new();
    for sheet_name in names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet: {sheet_name}"))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        let (sheet_id, row_count) = replace_sheet(db_path, &sheet_name, rows)?;
        info!(sheet = %sheet_name, rows = row_count, "sheet imported");

        imported.push(ImportResult {
            sheet_id,
            sheet_name,
            row_count,
        });
    }

    Ok(imported)
}
