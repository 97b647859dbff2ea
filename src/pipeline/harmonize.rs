//! Harmonisation: service vocabulary (`headers`, `data`) → storage
//! vocabulary (`columns`, `rows`).
//!
//! A pure structural rename. Width mismatches between `columns` and a row are
//! left untouched here and resolved when the table is stored (see
//! [`crate::store::Store::insert_table`]).

use crate::model::{ExtractedTable, Table};

/// Convert one extracted table into the canonical [`Table`] shape.
pub fn harmonize(table: ExtractedTable) -> Table {
    let ExtractedTable {
        filename,
        page_number,
        raw,
    } = table;
    Table {
        filename,
        page_number,
        title: raw.title,
        columns: raw.headers,
        rows: raw.data,
    }
}

/// Harmonise every table, keeping order.
pub fn harmonize_all(tables: Vec<ExtractedTable>) -> Vec<Table> {
    tables.into_iter().map(harmonize).collect()
}
