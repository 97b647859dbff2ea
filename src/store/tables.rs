//! Table insertion and read-back.
//!
//! A [`Table`] is decomposed into one `tables` row, one `"columns"` row per
//! column, one `"rows"` row per data row and one `cell_values` row per cell.
//! Insertion order is the ordinal: ids are `AUTOINCREMENT`, so ordering by id
//! recovers column and row order.
//!
//! `cell_values.column_id` holds the generated primary key of the matching
//! `"columns"` row, never a positional index.
//!
//! Rows are conformed to the column count before insertion: short rows are
//! padded with empty cells, surplus cells are dropped with a warning. A table
//! without headers gets `column_1..column_w` names, `w` being its widest row.

use super::registry;
use super::Store;
use crate::error::ExtractorError;
use crate::model::{Document, Table};
use rusqlite::{params, Connection};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Row count of one stored table, used by the chart report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowCount {
    pub table_id: i64,
    pub filename: String,
    pub page_number: usize,
    pub title: String,
    pub rows: usize,
}

impl Store {
    /// Insert one table outside any explicit transaction. Returns its id.
    pub fn insert_table(&self, table: &Table) -> Result<i64, ExtractorError> {
        Ok(insert_table(&self.conn, table)?)
    }

    /// Persist every table of `document` and register the document, in one
    /// transaction. Either all of it lands or none of it does.
    pub fn persist_file(
        &mut self,
        document: &Document,
        tables: &[Table],
    ) -> Result<Vec<i64>, ExtractorError> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(tables.len());
        for table in tables {
            ids.push(insert_table(&tx, table)?);
        }
        registry::mark_processed(&tx, &document.filename, &document.hash)?;
        tx.commit()?;
        debug!(
            "Persisted {} tables for {} ({})",
            ids.len(),
            document.filename,
            document.hash
        );
        Ok(ids)
    }

    /// Stored tables for `filename`, in insertion order.
    pub fn load_tables(&self, filename: &str) -> Result<Vec<Table>, ExtractorError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, page_number, title FROM tables WHERE filename = ?1 ORDER BY id",
        )?;
        let heads = stmt
            .query_map(params![filename], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tables = Vec::with_capacity(heads.len());
        for (id, filename, page_number, title) in heads {
            tables.push(Table {
                filename,
                page_number: page_number as usize,
                title,
                columns: load_columns(&self.conn, id)?,
                rows: load_rows(&self.conn, id)?,
            });
        }
        Ok(tables)
    }

    /// Row count per stored table, in insertion order.
    pub fn table_row_counts(&self) -> Result<Vec<TableRowCount>, ExtractorError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT t.id, t.filename, t.page_number, t.title, COUNT(r.id)
               FROM tables t LEFT JOIN "rows" r ON r.table_id = t.id
               GROUP BY t.id ORDER BY t.id"#,
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok(TableRowCount {
                    table_id: row.get(0)?,
                    filename: row.get(1)?,
                    page_number: row.get::<_, i64>(2)? as usize,
                    title: row.get(3)?,
                    rows: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }
}

fn insert_table(conn: &Connection, table: &Table) -> rusqlite::Result<i64> {
    conn.prepare_cached("INSERT INTO tables (filename, page_number, title) VALUES (?1, ?2, ?3)")?
        .execute(params![table.filename, table.page_number as i64, table.title])?;
    let table_id = conn.last_insert_rowid();

    let mut column_ids = Vec::with_capacity(table.columns.len());
    {
        let mut stmt =
            conn.prepare_cached(r#"INSERT INTO "columns" (table_id, name) VALUES (?1, ?2)"#)?;
        for name in column_names(table).iter() {
            stmt.execute(params![table_id, name])?;
            column_ids.push(conn.last_insert_rowid());
        }
    }

    let mut row_stmt = conn.prepare_cached(r#"INSERT INTO "rows" (table_id) VALUES (?1)"#)?;
    let mut cell_stmt =
        conn.prepare_cached("INSERT INTO cell_values (row_id, column_id, value) VALUES (?1, ?2, ?3)")?;

    for (ordinal, cells) in table.rows.iter().enumerate() {
        if cells.len() != column_ids.len() {
            warn!(
                "{} p{} '{}': row {} has {} cells for {} columns; conforming",
                table.filename,
                table.page_number,
                table.title,
                ordinal + 1,
                cells.len(),
                column_ids.len()
            );
        }
        row_stmt.execute(params![table_id])?;
        let row_id = conn.last_insert_rowid();

        for (i, column_id) in column_ids.iter().enumerate() {
            let value = cells.get(i).map(String::as_str).unwrap_or("");
            cell_stmt.execute(params![row_id, column_id, value])?;
        }
    }

    Ok(table_id)
}

/// Header names to store for `table`, synthesised when the service sent none.
fn column_names(table: &Table) -> Cow<'_, [String]> {
    if !table.columns.is_empty() {
        return Cow::Borrowed(&table.columns);
    }
    let width = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    Cow::Owned((1..=width).map(|i| format!("column_{i}")).collect())
}

fn load_columns(conn: &Connection, table_id: i64) -> rusqlite::Result<Vec<String>> {
    conn.prepare_cached(r#"SELECT name FROM "columns" WHERE table_id = ?1 ORDER BY id"#)?
        .query_map(params![table_id], |row| row.get(0))?
        .collect()
}

fn load_rows(conn: &Connection, table_id: i64) -> rusqlite::Result<Vec<Vec<String>>> {
    let row_ids: Vec<i64> = conn
        .prepare_cached(r#"SELECT id FROM "rows" WHERE table_id = ?1 ORDER BY id"#)?
        .query_map(params![table_id], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut cell_stmt = conn.prepare_cached(
        r#"SELECT v.value FROM cell_values v JOIN "columns" c ON c.id = v.column_id
           WHERE v.row_id = ?1 ORDER BY c.id"#,
    )?;
    let mut rows = Vec::with_capacity(row_ids.len());
    for row_id in row_ids {
        let cells = cell_stmt
            .query_map(params![row_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        rows.push(cells);
    }
    Ok(rows)
}
