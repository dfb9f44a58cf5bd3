//! Entity export command.
//!
//! Fetches the per-client activity export for a period and tabulates it.
//! Depending on the server version the endpoint answers with a JSON
//! array, a `data`-wrapped array, or NDJSON; the client normalises all
//! three to a record list before this module shapes the table.
//!
//! # Usage
//!
//! ```bash
//! vault-tools entity-export -s 2025-06-01 -e 2025-06-30
//! ```

use anyhow::Result;
use serde_json::{Map, Number, Value};
use tracing::{info, warn};

use crate::config::{GlobalConfig, VaultConfig};
use crate::utils::output::{report_path, write_csv_objects, write_json};
use crate::utils::time::{entity_export_window, validate_date};
use crate::vault_api::{VaultClient, VaultError};

const EXPORT_PATH: &str = "sys/internal/counters/activity/export";

pub async fn run(global: &GlobalConfig, start_date: &str, end_date: &str) -> Result<()> {
    let vault_config = VaultConfig::from_env()?;
    let client = VaultClient::new(&vault_config)?;
    let cluster_name = client.validate_connection().await?;

    export_with_client(&client, &cluster_name, global, start_date, end_date).await
}

/// Export against an already-validated client.
///
/// An empty export is a warning, not an error; any other failure is
/// fatal and no artifacts are written.
pub async fn export_with_client(
    client: &VaultClient,
    cluster_name: &str,
    global: &GlobalConfig,
    start_date: &str,
    end_date: &str,
) -> Result<()> {
    validate_date(start_date)?;
    validate_date(end_date)?;

    info!(start_date, end_date, "fetching entity export data");
    let (start_time, end_time) = entity_export_window(start_date, end_date);
    let params = [
        ("start_time", start_time),
        ("end_time", end_time),
        ("format", "json".to_string()),
    ];
    let response = client.get(EXPORT_PATH, Some(&params), "").await?;

    let records = normalize_records(response)?;
    if records.is_empty() {
        warn!("no entity data to process");
        return Ok(());
    }
    info!(records = records.len(), "tabulating entity export");

    let (headers, rows) = tabulate_records(&records)?;

    write_json(
        &report_path(&global.output_dir, cluster_name, "entity-export", "json"),
        &records,
    )?;
    write_csv_objects(
        &report_path(&global.output_dir, cluster_name, "entity-export", "csv"),
        &rows,
        Some(headers),
    )?;

    Ok(())
}

/// Normalise the export response to a list of record objects.
///
/// Accepts a bare array, a `{"data": [...]}` wrapper, or the array the
/// client already assembled from NDJSON lines. An empty object or a
/// null `data` field means the period had no activity.
pub fn normalize_records(response: Value) -> Result<Vec<Map<String, Value>>, VaultError> {
    let list = match response {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => return Err(data_error(format!("unexpected data field: {other}"))),
        },
        other => return Err(data_error(format!("unexpected response shape: {other}"))),
    };

    list.into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(data_error(format!("record is not an object: {other}"))),
        })
        .collect()
}

/// Shape the record list into CSV headers and rows.
///
/// Adds `entity_type` (a copy of `client_type`), rewrites the root
/// namespace path for display, and coerces float columns with no
/// fractional parts to integers so counts render without a `.0` tail.
pub fn tabulate_records(
    records: &[Map<String, Value>],
) -> Result<(Vec<String>, Vec<Map<String, Value>>), VaultError> {
    if !records.iter().any(|r| r.contains_key("client_type")) {
        return Err(data_error(
            "column 'client_type' not found in export data".to_string(),
        ));
    }

    let mut rows: Vec<Map<String, Value>> = records.to_vec();
    for row in &mut rows {
        let entity_type = row.get("client_type").cloned().unwrap_or(Value::Null);
        row.insert("entity_type".to_string(), entity_type);

        let is_root = row.get("namespace_id").and_then(Value::as_str) == Some("root")
            && row.get("namespace_path").and_then(Value::as_str) == Some("");
        if is_root {
            row.insert(
                "namespace_path".to_string(),
                Value::String("root/".to_string()),
            );
        }
    }

    let headers = column_order(&rows);
    for column in &headers {
        coerce_integral_column(&mut rows, column);
    }

    Ok((headers, rows))
}

/// Column order: the first record's key order, then any keys only later
/// records carry, as they first appear.
fn column_order(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Rewrite a column as integers when every non-null value is a number
/// with no fractional part.
fn coerce_integral_column(rows: &mut [Map<String, Value>], column: &str) {
    let mut saw_number = false;
    for row in rows.iter() {
        match row.get(column) {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => {
                let integral = n.as_i64().is_some()
                    || n.as_u64().is_some()
                    || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0);
                if !integral {
                    return;
                }
                saw_number = true;
            }
            Some(_) => return,
        }
    }
    if !saw_number {
        return;
    }

    for row in rows.iter_mut() {
        if let Some(Value::Number(n)) = row.get(column) {
            if n.as_i64().is_none() && n.as_u64().is_none() {
                if let Some(f) = n.as_f64() {
                    row.insert(column.to_string(), Value::Number(Number::from(f as i64)));
                }
            }
        }
    }
}

fn data_error(reason: String) -> VaultError {
    VaultError::Data {
        path: EXPORT_PATH.to_string(),
        reason,
    }
}
