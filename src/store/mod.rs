//! SQLite persistence: extracted tables and the processed-file registry.
//!
//! [`Store`] owns the single connection used by a run. Its methods are split
//! across submodules by concern:
//!
//! * [`schema`]: `CREATE TABLE IF NOT EXISTS` for every relation
//! * [`registry`]: `is_processed` / `mark_processed` over `processed_files`
//! * [`tables`]: table insertion, atomic per-file persistence, read-back
//!
//! The connection is released when the `Store` is dropped; [`Store::close`]
//! does the same but surfaces any error from SQLite.

pub mod registry;
pub mod schema;
pub mod tables;

pub use tables::TableRowCount;

use crate::error::ExtractorError;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Single-writer handle on the extraction database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    ExtractorError::OutputWriteFailed {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }
        debug!("Opening database {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, ExtractorError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, ExtractorError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::create_schema_if_absent(&conn)?;
        Ok(Self { conn })
    }

    /// Read-only access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<(), ExtractorError> {
        self.conn.close().map_err(|(_, e)| ExtractorError::Storage(e))
    }
}
