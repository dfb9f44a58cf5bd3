//! Report writer tests.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use vault_tools::utils::output::{
    report_path, write_csv_objects, write_csv_records, write_csv_serialize, write_json,
};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn test_write_json_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/outputs/report.json");

    write_json(&path, &json!({"team-a": {"id": "ns1"}})).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"team-a\""));
    // Pretty-printed with two-space indent.
    assert!(content.contains("\n  \"team-a\""));
    let parsed: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["team-a"]["id"], "ns1");
}

#[test]
fn test_write_json_keeps_non_ascii() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");

    write_json(&path, &json!({"name": "équipe"})).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("équipe"));
    assert!(!content.contains("\\u"));
}

#[test]
fn test_write_csv_records_headers_then_rows() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("summary.csv");

    let headers = vec!["namespace".to_string(), "kv".to_string()];
    let rows = vec![
        vec!["".to_string(), "2".to_string()],
        vec!["team-a".to_string(), "0".to_string()],
    ];
    write_csv_records(&path, &headers, &rows).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, ["namespace,kv", ",2", "team-a,0"]);
}

#[test]
fn test_write_csv_objects_derives_headers_from_first_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rows.csv");

    let rows = vec![
        object(json!({"path": "team-a", "id": "ns1", "custom_metadata": {"env": "prod"}})),
        object(json!({"path": "team-b", "id": "ns2"})),
    ];
    write_csv_objects(&path, &rows, None).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "path,id,custom_metadata");
    // Nested values are JSON-encoded inside the cell.
    assert_eq!(lines[1], "team-a,ns1,\"{\"\"env\"\":\"\"prod\"\"}\"");
    // Rows missing a column produce an empty cell.
    assert_eq!(lines[2], "team-b,ns2,");
}

#[test]
fn test_write_csv_objects_with_explicit_headers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rows.csv");

    let rows = vec![object(json!({"b": 2, "a": 1}))];
    write_csv_objects(&path, &rows, Some(vec!["a".to_string(), "b".to_string()])).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().next(), Some("a,b"));
}

#[test]
fn test_write_csv_serialize_uses_field_names() {
    #[derive(Serialize)]
    struct Row {
        namespace_id: String,
        clients: u64,
    }

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("activity.csv");

    let rows = vec![
        Row {
            namespace_id: "root".to_string(),
            clients: 5,
        },
        Row {
            namespace_id: "ns2".to_string(),
            clients: 0,
        },
    ];
    write_csv_serialize(&path, &rows).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, ["namespace_id,clients", "root,5", "ns2,0"]);
}

#[test]
fn test_report_path_naming() {
    let path = report_path(Path::new("outputs"), "vault-cluster-1", "namespaces", "json");
    let name = path.file_name().unwrap().to_str().unwrap();

    assert!(name.starts_with("vault-cluster-1-namespaces-"));
    assert!(name.ends_with(".json"));
    let stamp = name
        .trim_start_matches("vault-cluster-1-namespaces-")
        .trim_end_matches(".json");
    assert_eq!(stamp.len(), 8);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    assert!(path.starts_with("outputs"));
}
