//! Row-file import/export glue.
//!
//! Imported spreadsheets reach the pipeline as a JSON array of records;
//! enriched rows are written back the same way for later export.
//! Spreadsheet formats themselves live outside this tool.
use crate::record::Record;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a JSON array of records from a row file.
pub fn load_rows(path: &Path) -> Result<Vec<Record>> {
    let bytes = fs::read(path).with_context(|| format!("read rows {}", path.display()))?;
    let rows: Vec<Record> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse rows JSON {}", path.display()))?;
    Ok(rows)
}

/// Write enriched rows back as pretty JSON.
pub fn write_rows(path: &Path, rows: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("create output dir")?;
        }
    }
    let text = serde_json::to_string_pretty(rows).context("serialize rows")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
