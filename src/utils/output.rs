//! Report file writing.
//!
//! Every artifact lands in the output directory as
//! `<cluster>-<kind>-<YYYYMMDD>.{json,csv}`. Parent directories are
//! created on demand; JSON is pretty-printed UTF-8, CSV cells are
//! stringified with nested values JSON-encoded.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::utils::time::date_stamp;

/// Build the canonical report path for a cluster artifact.
pub fn report_path(output_dir: &Path, cluster_name: &str, kind: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("{cluster_name}-{kind}-{}.{extension}", date_stamp()))
}

/// Write a pretty-printed JSON report.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("failed to write JSON to {}", path.display()))?;
    info!(path = %path.display(), "JSON report written");
    Ok(())
}

/// Write a CSV report from explicit headers and pre-rendered rows.
pub fn write_csv_records(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "CSV report written");
    Ok(())
}

/// Write a CSV report from serde-serializable rows; headers come from
/// the struct field names.
pub fn write_csv_serialize<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "CSV report written");
    Ok(())
}

/// Write a CSV report from JSON object rows.
///
/// Headers default to the key order of the first row; rows missing a
/// column produce an empty cell.
pub fn write_csv_objects(
    path: &Path,
    rows: &[serde_json::Map<String, Value>],
    headers: Option<Vec<String>>,
) -> Result<()> {
    let headers = headers.unwrap_or_else(|| match rows.first() {
        Some(first) => first.keys().cloned().collect(),
        None => Vec::new(),
    });
    if headers.is_empty() && rows.is_empty() {
        return Ok(());
    }

    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|column| row.get(column).map(value_to_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    write_csv_records(path, &headers, &rendered)
}

/// Render a JSON value as a CSV cell.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested structures keep their JSON form inside the cell.
        other => other.to_string(),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_cell() {
        assert_eq!(value_to_cell(&Value::Null), "");
        assert_eq!(value_to_cell(&json!("abc")), "abc");
        assert_eq!(value_to_cell(&json!(42)), "42");
        assert_eq!(value_to_cell(&json!(true)), "true");
        assert_eq!(value_to_cell(&json!({"env": "prod"})), r#"{"env":"prod"}"#);
        assert_eq!(value_to_cell(&json!([1, 2])), "[1,2]");
    }
}
