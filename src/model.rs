//! Data types shared by the pipeline stages and the store.

use image::DynamicImage;
use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A PDF file identified by name and content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full path on disk.
    pub path: PathBuf,
    /// File name (no directory), used as the registry key.
    pub filename: String,
    /// Lowercase hex MD5 of the raw file bytes.
    pub hash: String,
}

impl Document {
    /// Build a document from a path and the bytes read from it.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            filename,
            hash: content_hash(bytes),
        }
    }
}

/// Lowercase hex MD5 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// One rasterised page. `number` is 1-based.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub image: DynamicImage,
}

/// A table as returned by the extraction service.
///
/// Missing fields default to empty so a `{"title": "x"}` object still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default, deserialize_with = "cell_text")]
    pub title: String,
    #[serde(default, deserialize_with = "cell_list")]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "cell_rows")]
    pub data: Vec<Vec<String>>,
}

/// A [`RawTable`] tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub filename: String,
    pub page_number: usize,
    pub raw: RawTable,
}

/// Canonical stored table shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub filename: String,
    pub page_number: usize,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ── Lenient cell deserialisation ─────────────────────────────────────────
//
// Models frequently emit numbers or nulls inside `data`. Cells are stored as
// text, so scalars are stringified and null becomes "".

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn cell_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(d)?))
}

fn cell_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let values: Option<Vec<Value>> = Option::deserialize(d)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(value_to_text)
        .collect())
}

fn cell_rows<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<String>>, D::Error> {
    let rows: Option<Vec<Vec<Value>>> = Option::deserialize(d)?;
    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.into_iter().map(value_to_text).collect())
        .collect())
}
