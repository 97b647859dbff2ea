//! Database schema.
//!
//! `columns` and `rows` collide with SQL keywords, so they are always
//! double-quoted in statements.

use rusqlite::Connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS "columns" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_id INTEGER NOT NULL REFERENCES tables(id),
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS "rows" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_id INTEGER NOT NULL REFERENCES tables(id)
);

CREATE TABLE IF NOT EXISTS cell_values (
    row_id INTEGER NOT NULL REFERENCES "rows"(id),
    column_id INTEGER NOT NULL REFERENCES "columns"(id),
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS processed_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    file_hash TEXT NOT NULL,
    UNIQUE (filename, file_hash)
);

CREATE INDEX IF NOT EXISTS idx_tables_filename ON tables(filename);
CREATE INDEX IF NOT EXISTS idx_columns_table ON "columns"(table_id);
CREATE INDEX IF NOT EXISTS idx_rows_table ON "rows"(table_id);
CREATE INDEX IF NOT EXISTS idx_cells_row ON cell_values(row_id);
"#;

/// Create every relation and index that does not exist yet. Safe to call on
/// every run.
pub fn create_schema_if_absent(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
