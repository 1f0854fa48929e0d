use std::path::Path;

use anyhow::{Context, Result};

use crate::infra::import::ImportResult;
use crate::infra::sqlite::queries::{read_sheet, replace_sheet};
use crate::infra::sqlite::schema::init_db;

/// Loads a CSV file into one sheet, replacing its contents. The first CSV
/// record becomes the header row. The sheet name defaults to the file stem.
pub fn import_csv_sheet(db_path: &Path, csv_path: &Path, sheet: Option<&str>) -> Result<ImportResult> {
    init_db(db_path)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if rows.first().map_or(true, |headers| headers.iter().all(String::is_empty)) {
        anyhow::bail!("csv header is required")
    }

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => csv_path
            .file_stem()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Sheet1")
            .to_string(),
    };

    let (sheet_id, row_count) = replace_sheet(db_path, &sheet_name, rows)?;

    Ok(ImportResult {
        sheet_id,
        sheet_name,
        row_count,
    })
}

/// Writes a sheet, header row included, to `csv_path`. Returns the number of
/// records written.
pub fn export_csv_sheet(db_path: &Path, sheet: &str, csv_path: &Path) -> Result<usize> {
    init_db(db_path)?;
    let grid = read_sheet(db_path, sheet)?
        .with_context(|| format!("sheet not found: {sheet}"))?;

    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create csv: {}", csv_path.display()))?;
    for row in grid.rows() {
        writer
            .write_record(row)
            .context("failed to write csv record")?;
    }
    writer.flush().context("failed to flush csv writer")?;

    Ok(grid.height())
}
