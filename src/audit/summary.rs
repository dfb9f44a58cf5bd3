//! CSV summary tables for audit results.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde_json::Value;

use crate::vault_api::{MountMap, NamespaceInfo};

/// Namespace table: one row per discovered namespace with its id and
/// JSON-encoded custom metadata.
pub fn namespace_summary(
    namespaces: &BTreeMap<String, NamespaceInfo>,
) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "path".to_string(),
        "id".to_string(),
        "custom_metadata".to_string(),
    ];
    let rows = namespaces
        .iter()
        .map(|(path, info)| {
            let metadata = match &info.custom_metadata {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.to_string(),
            };
            vec![path.clone(), info.id.clone(), metadata]
        })
        .collect();
    (headers, rows)
}

/// Mount-type count table: `namespace` plus one column per observed
/// mount type, in first-seen order, with missing cells filled with 0.
pub fn mount_type_summary(
    mounts_by_namespace: &BTreeMap<String, MountMap>,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut type_columns: Vec<String> = Vec::new();
    let mut counted: Vec<(&String, HashMap<&str, usize>)> = Vec::new();

    for (namespace, mounts) in mounts_by_namespace {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for info in mounts.values() {
            let Some(mount_type) = info.get("type").and_then(Value::as_str) else {
                continue;
            };
            *counts.entry(mount_type).or_insert(0) += 1;
            if !type_columns.iter().any(|c| c == mount_type) {
                type_columns.push(mount_type.to_string());
            }
        }
        counted.push((namespace, counts));
    }

    let mut headers = vec!["namespace".to_string()];
    headers.extend(type_columns.iter().cloned());

    let rows = counted
        .into_iter()
        .map(|(namespace, counts)| {
            let mut row = vec![namespace.clone()];
            for column in &type_columns {
                row.push(counts.get(column.as_str()).copied().unwrap_or(0).to_string());
            }
            row
        })
        .collect();

    (headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mounts(entries: &[(&str, &str)]) -> MountMap {
        let mut map = MountMap::new();
        for (path, mount_type) in entries {
            map.insert((*path).to_string(), json!({"type": mount_type}));
        }
        map
    }

    #[test]
    fn test_namespace_summary_rows() {
        let mut namespaces = BTreeMap::new();
        namespaces.insert(
            "team-a".to_string(),
            NamespaceInfo {
                id: "ns1".to_string(),
                custom_metadata: Some(json!({"owner": "platform"})),
            },
        );
        namespaces.insert(
            "team-b".to_string(),
            NamespaceInfo {
                id: "ns2".to_string(),
                custom_metadata: None,
            },
        );

        let (headers, rows) = namespace_summary(&namespaces);
        assert_eq!(headers, ["path", "id", "custom_metadata"]);
        assert_eq!(
            rows[0],
            ["team-a", "ns1", r#"{"owner":"platform"}"#]
        );
        assert_eq!(rows[1], ["team-b", "ns2", ""]);
    }

    #[test]
    fn test_mount_type_summary_counts_and_zero_fill() {
        let mut by_namespace = BTreeMap::new();
        by_namespace.insert(
            "".to_string(),
            mounts(&[("token/", "token"), ("kv/", "kv"), ("secret/", "kv")]),
        );
        by_namespace.insert("team-a".to_string(), mounts(&[("approle/", "approle")]));

        let (headers, rows) = mount_type_summary(&by_namespace);
        assert_eq!(headers, ["namespace", "token", "kv", "approle"]);
        assert_eq!(rows[0], ["", "1", "2", "0"]);
        assert_eq!(rows[1], ["team-a", "0", "0", "1"]);
    }

    #[test]
    fn test_mount_type_summary_ignores_untyped_entries() {
        let mut by_namespace = BTreeMap::new();
        let mut map = mounts(&[("kv/", "kv")]);
        map.insert("odd/".to_string(), json!({"description": "no type"}));
        by_namespace.insert("".to_string(), map);

        let (headers, rows) = mount_type_summary(&by_namespace);
        assert_eq!(headers, ["namespace", "kv"]);
        assert_eq!(rows, [["", "1"]]);
    }

    #[test]
    fn test_mount_type_summary_empty() {
        let by_namespace = BTreeMap::new();
        let (headers, rows) = mount_type_summary(&by_namespace);
        assert_eq!(headers, ["namespace"]);
        assert!(rows.is_empty());
    }
}
