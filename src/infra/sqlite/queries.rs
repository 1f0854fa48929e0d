use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::domain::entities::grid::{BatchRequest, Grid, SheetError};
use crate::domain::entities::sheet::{SheetId, SheetMeta};
use crate::infra::sqlite::schema::open_connection;

pub fn find_sheet_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM sheet WHERE name = ?1", [name], |row| {
        row.get::<_, i64>(0)
    })
    .optional()
    .with_context(|| format!("failed to look up sheet: {name}"))
}

pub fn ensure_sheet(tx: &Transaction<'_>, name: &str) -> Result<i64> {
    tx.execute("INSERT OR IGNORE INTO sheet(name) VALUES (?1)", [name])
        .with_context(|| format!("failed to create sheet: {name}"))?;
    find_sheet_id(tx, name)?.with_context(|| format!("sheet vanished after insert: {name}"))
}

pub fn load_grid(conn: &Connection, sheet_id: i64) -> Result<Grid> {
    let shape = conn
        .query_row(
            "SELECT row_count, column_count FROM sheet WHERE id = ?1",
            [sheet_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .context("failed to query sheet shape")?;
    let (row_count, column_count) = shape.ok_or(SheetError::UnknownSheet(SheetId(sheet_id)))?;

    let mut grid = Grid::with_shape(row_count as usize, column_count as usize);

    let mut stmt = conn
        .prepare(
            "SELECT row_idx, col_idx, value
             FROM cell
             WHERE sheet_id = ?1
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare cell query")?;
    let mut rows = stmt.query([sheet_id]).context("failed to query cells")?;
    while let Some(row) = rows.next().context("failed to read cell")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let value: String = row.get(2).context("failed to read value")?;
        grid.set(row_idx as usize, col_idx as usize, value);
    }

    Ok(grid)
}

/// Replaces every stored cell of the sheet. Empty cells are not stored;
/// the sheet row keeps the shape.
pub fn store_grid(tx: &Transaction<'_>, sheet_id: i64, grid: &Grid) -> Result<()> {
    tx.execute("DELETE FROM cell WHERE sheet_id = ?1", params![sheet_id])
        .context("failed to clear existing cells")?;

    let mut insert_cell = tx
        .prepare("INSERT INTO cell(sheet_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare cell insert")?;
    for (row_idx, row) in grid.rows().iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            insert_cell
                .execute(params![sheet_id, row_idx as i64, col_idx as i64, value])
                .context("failed to insert cell")?;
        }
    }
    drop(insert_cell);

    tx.execute(
        "UPDATE sheet
         SET row_count = ?1, column_count = ?2, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?3",
        params![grid.height() as i64, grid.width() as i64, sheet_id],
    )
    .context("failed to update sheet shape")?;
    Ok(())
}

/// `None` when the sheet has never been created.
pub fn read_sheet(db_path: &Path, name: &str) -> Result<Option<Grid>> {
    let conn = open_connection(db_path)?;
    match find_sheet_id(&conn, name)? {
        Some(sheet_id) => load_grid(&conn, sheet_id).map(Some),
        None => Ok(None),
    }
}

pub fn sheet_id_for(db_path: &Path, name: &str) -> Result<i64> {
    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start sheet transaction")?;
    let sheet_id = ensure_sheet(&tx, name)?;
    tx.commit().context("failed to commit sheet creation")?;
    Ok(sheet_id)
}

/// Loads one sheet (creating it when missing), lets `mutate` change it, and
/// writes it back in a single transaction.
pub fn update_sheet<T, F>(db_path: &Path, name: &str, mutate: F) -> Result<T>
where
    F: FnOnce(&mut Grid) -> std::result::Result<T, SheetError>,
{
    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start update transaction")?;
    let sheet_id = ensure_sheet(&tx, name)?;
    let mut grid = load_grid(&tx, sheet_id)?;

    let value = mutate(&mut grid)?;

    store_grid(&tx, sheet_id, &grid)?;
    tx.commit()
        .with_context(|| format!("failed to commit update of sheet: {name}"))?;
    Ok(value)
}

pub fn apply_batch(db_path: &Path, requests: &[BatchRequest]) -> Result<()> {
    if requests.is_empty() {
        return Ok(());
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start batch transaction")?;

    let mut grids: HashMap<i64, Grid> = HashMap::new();
    let mut touched = Vec::new();
    for request in requests {
        let sheet_id = request.sheet_id().0;
        let grid = match grids.entry(sheet_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                touched.push(sheet_id);
                entry.insert(load_grid(&tx, sheet_id)?)
            }
        };
        grid.apply(request)?;
    }

    for sheet_id in touched {
        if let Some(grid) = grids.get(&sheet_id) {
            store_grid(&tx, sheet_id, grid)?;
        }
    }

    tx.commit().context("failed to commit batch update")?;
    Ok(())
}

pub fn replace_sheet(db_path: &Path, name: &str, rows: Vec<Vec<String>>) -> Result<(i64, i64)> {
    let height = update_sheet(db_path, name, |grid| {
        *grid = Grid::from_rows(rows);
        Ok(grid.height() as i64)
    })?;
    let conn = open_connection(db_path)?;
    let sheet_id = find_sheet_id(&conn, name)?
        .with_context(|| format!("sheet missing after import: {name}"))?;
    Ok((sheet_id, height))
}

pub fn list_sheets(db_path: &Path) -> Result<Vec<SheetMeta>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, name, row_count, column_count, updated_at
             FROM sheet
             ORDER BY id ASC",
        )
        .context("failed to prepare sheets query")?;

    let sheets = stmt
        .query_map([], |row| {
            Ok(SheetMeta {
                id: row.get::<_, i64>(0)?.into(),
                name: row.get(1)?,
                row_count: row.get(2)?,
                column_count: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })
        .context("failed to query sheets")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect sheets")?;

    Ok(sheets)
}
