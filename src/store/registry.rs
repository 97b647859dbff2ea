//! Processed-file registry over the `processed_files` relation.
//!
//! A file counts as processed only for the exact (filename, hash) pair that
//! was registered: renaming a file or changing its bytes makes it new again.
//! Records are never removed.

use super::Store;
use crate::error::ExtractorError;
use rusqlite::{params, Connection, OptionalExtension};

impl Store {
    /// Whether `(filename, hash)` has been fully processed in an earlier run.
    pub fn is_processed(&self, filename: &str, hash: &str) -> Result<bool, ExtractorError> {
        Ok(is_processed(&self.conn, filename, hash)?)
    }

    /// Register `(filename, hash)`. Durable as soon as this returns.
    pub fn mark_processed(&self, filename: &str, hash: &str) -> Result<(), ExtractorError> {
        Ok(mark_processed(&self.conn, filename, hash)?)
    }
}

pub(crate) fn is_processed(conn: &Connection, filename: &str, hash: &str) -> rusqlite::Result<bool> {
    conn.prepare_cached("SELECT 1 FROM processed_files WHERE filename = ?1 AND file_hash = ?2")?
        .query_row(params![filename, hash], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
}

pub(crate) fn mark_processed(conn: &Connection, filename: &str, hash: &str) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT OR IGNORE INTO processed_files (filename, file_hash) VALUES (?1, ?2)",
    )?
    .execute(params![filename, hash])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_file_is_unprocessed() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.is_processed("a.pdf", "h1").unwrap());
    }

    #[test]
    fn exact_pair_matches() {
        let store = Store::open_in_memory().unwrap();
        store.mark_processed("a.pdf", "h1").unwrap();
        assert!(store.is_processed("a.pdf", "h1").unwrap());
        assert!(!store.is_processed("a.pdf", "h2").unwrap());
        assert!(!store.is_processed("b.pdf", "h1").unwrap());
    }

    #[test]
    fn marking_twice_keeps_one_record() {
        let store = Store::open_in_memory().unwrap();
        store.mark_processed("a.pdf", "h1").unwrap();
        store.mark_processed("a.pdf", "h1").unwrap();
        let n: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM processed_files", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }
}
