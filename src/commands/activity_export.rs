//! Activity export command.
//!
//! Fetches client activity counts for a billing period from
//! `sys/internal/counters/activity` and flattens the per-namespace
//! breakdown into two CSV tables, one row per namespace and one row per
//! mount.
//!
//! # Usage
//!
//! ```bash
//! vault-tools activity-export -s 2025-06-01 -e 2025-07-01
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::{GlobalConfig, VaultConfig};
use crate::utils::output::{report_path, write_csv_serialize, write_json};
use crate::utils::time::{activity_window, validate_date};
use crate::vault_api::{extract_data, VaultClient, VaultError};

#[derive(Debug, Clone, Default, Deserialize)]
struct ActivityCounts {
    #[serde(default)]
    clients: u64,
    #[serde(default)]
    entity_clients: u64,
    #[serde(default)]
    non_entity_clients: u64,
}

#[derive(Debug, Deserialize)]
struct ActivityMount {
    #[serde(default)]
    mount_path: String,
    #[serde(default)]
    counts: ActivityCounts,
}

#[derive(Debug, Deserialize)]
struct ActivityNamespace {
    #[serde(default)]
    namespace_id: String,
    #[serde(default)]
    namespace_path: String,
    #[serde(default)]
    counts: ActivityCounts,
    #[serde(default)]
    mounts: Vec<ActivityMount>,
}

/// One row of the per-namespace CSV.
#[derive(Debug, PartialEq, Serialize)]
pub struct NamespaceActivityRow {
    pub namespace_id: String,
    pub namespace_path: String,
    pub mounts: usize,
    pub clients: u64,
    pub entity_clients: u64,
    pub non_entity_clients: u64,
}

/// One row of the per-mount CSV.
#[derive(Debug, PartialEq, Serialize)]
pub struct MountActivityRow {
    pub namespace_id: String,
    pub namespace_path: String,
    pub mount_path: String,
    pub clients: u64,
    pub entity_clients: u64,
    pub non_entity_clients: u64,
}

pub async fn run(global: &GlobalConfig, start_date: &str, end_date: &str) -> Result<()> {
    let vault_config = VaultConfig::from_env()?;
    let client = VaultClient::new(&vault_config)?;
    let cluster_name = client.validate_connection().await?;

    export_with_client(&client, &cluster_name, global, start_date, end_date).await
}

/// Export against an already-validated client.
///
/// Any failure is fatal to the export; no partial artifacts are written.
pub async fn export_with_client(
    client: &VaultClient,
    cluster_name: &str,
    global: &GlobalConfig,
    start_date: &str,
    end_date: &str,
) -> Result<()> {
    validate_date(start_date)?;
    validate_date(end_date)?;

    info!(start_date, end_date, "fetching activity data");
    let (start_time, end_time) = activity_window(start_date, end_date);
    let params = [("start_time", start_time), ("end_time", end_time)];
    let response = client
        .get("sys/internal/counters/activity", Some(&params), "")
        .await?;
    let data = extract_data(response);

    let (namespace_rows, mount_rows) = flatten_activity(&data)?;
    info!(
        namespaces = namespace_rows.len(),
        mounts = mount_rows.len(),
        "flattened activity data"
    );

    write_json(
        &report_path(&global.output_dir, cluster_name, "activity", "json"),
        &data,
    )?;
    write_csv_serialize(
        &report_path(&global.output_dir, cluster_name, "activity-namespaces", "csv"),
        &namespace_rows,
    )?;
    write_csv_serialize(
        &report_path(&global.output_dir, cluster_name, "activity-mounts", "csv"),
        &mount_rows,
    )?;

    Ok(())
}

/// Flatten the `by_namespace` breakdown into namespace and mount rows.
///
/// Missing counts default to 0 and missing strings to empty. The root
/// namespace is rendered as `root/` when the server reports it with id
/// `root` and an empty path.
pub fn flatten_activity(
    data: &Value,
) -> Result<(Vec<NamespaceActivityRow>, Vec<MountActivityRow>), VaultError> {
    let by_namespace: Vec<ActivityNamespace> = match data.get("by_namespace") {
        None | Some(Value::Null) => Vec::new(),
        Some(list) => serde_json::from_value(list.clone()).map_err(|e| VaultError::Data {
            path: "sys/internal/counters/activity".to_string(),
            reason: e.to_string(),
        })?,
    };

    let mut namespace_rows = Vec::with_capacity(by_namespace.len());
    let mut mount_rows = Vec::new();

    for namespace in by_namespace {
        let namespace_path = display_namespace_path(&namespace.namespace_id, &namespace.namespace_path);

        namespace_rows.push(NamespaceActivityRow {
            namespace_id: namespace.namespace_id.clone(),
            namespace_path: namespace_path.clone(),
            mounts: namespace.mounts.len(),
            clients: namespace.counts.clients,
            entity_clients: namespace.counts.entity_clients,
            non_entity_clients: namespace.counts.non_entity_clients,
        });

        for mount in namespace.mounts {
            mount_rows.push(MountActivityRow {
                namespace_id: namespace.namespace_id.clone(),
                namespace_path: namespace_path.clone(),
                mount_path: mount.mount_path,
                clients: mount.counts.clients,
                entity_clients: mount.counts.entity_clients,
                non_entity_clients: mount.counts.non_entity_clients,
            });
        }
    }

    Ok((namespace_rows, mount_rows))
}

/// The root namespace is keyed internally as an empty path; reports show
/// it as `root/`, but only when the server itself calls it `root`.
pub fn display_namespace_path(namespace_id: &str, namespace_path: &str) -> String {
    if namespace_id == "root" && namespace_path.is_empty() {
        "root/".to_string()
    } else {
        namespace_path.to_string()
    }
}
