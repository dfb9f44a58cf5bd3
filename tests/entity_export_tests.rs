//! Entity export normalisation and tabulation tests.

use serde_json::{json, Map, Value};

use vault_tools::commands::entity_export::{normalize_records, tabulate_records};
use vault_tools::vault_api::{decode_body, VaultError};

fn records_from(value: Value) -> Vec<Map<String, Value>> {
    normalize_records(value).unwrap()
}

#[test]
fn test_normalize_bare_array() {
    let records = records_from(json!([{"client_id": "a"}, {"client_id": "b"}]));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["client_id"], "a");
}

#[test]
fn test_normalize_data_wrapper() {
    let records = records_from(json!({"data": [{"client_id": "a"}]}));
    assert_eq!(records.len(), 1);
}

#[test]
fn test_normalize_empty_shapes() {
    assert!(records_from(json!({})).is_empty());
    assert!(records_from(json!({"data": null})).is_empty());
    assert!(records_from(json!([])).is_empty());
}

#[test]
fn test_normalize_rejects_scalars() {
    assert!(matches!(
        normalize_records(json!("nope")),
        Err(VaultError::Data { .. })
    ));
    assert!(matches!(
        normalize_records(json!([1, 2])),
        Err(VaultError::Data { .. })
    ));
}

#[test]
fn test_ndjson_body_to_table() {
    let body = "{\"client_id\":\"a\",\"client_type\":\"entity\"}\n{\"client_id\":\"b\",\"client_type\":\"non_entity\"}\n";
    let records = records_from(decode_body("export", body).unwrap());
    assert_eq!(records.len(), 2);

    let (headers, rows) = tabulate_records(&records).unwrap();
    assert!(headers.contains(&"client_id".to_string()));
    assert!(headers.contains(&"entity_type".to_string()));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["entity_type"], "entity");
    assert_eq!(rows[1]["entity_type"], "non_entity");
}

#[test]
fn test_tabulate_requires_client_type() {
    let records = records_from(json!([{"client_id": "a"}]));
    assert!(matches!(
        tabulate_records(&records),
        Err(VaultError::Data { .. })
    ));
}

#[test]
fn test_tabulate_rewrites_root_namespace_path() {
    let records = records_from(json!([
        {
            "client_id": "a",
            "client_type": "entity",
            "namespace_id": "root",
            "namespace_path": ""
        },
        {
            "client_id": "b",
            "client_type": "entity",
            "namespace_id": "ns2",
            "namespace_path": "team-a/"
        }
    ]));

    let (_, rows) = tabulate_records(&records).unwrap();
    assert_eq!(rows[0]["namespace_path"], "root/");
    assert_eq!(rows[1]["namespace_path"], "team-a/");
}

#[test]
fn test_tabulate_coerces_integral_float_columns() {
    let records = records_from(json!([
        {"client_id": "a", "client_type": "entity", "uses": 5.0, "ratio": 1.5},
        {"client_id": "b", "client_type": "entity", "uses": null, "ratio": 2.0},
        {"client_id": "c", "client_type": "entity", "uses": 7.0, "ratio": 0.25}
    ]));

    let (_, rows) = tabulate_records(&records).unwrap();
    // `uses` is integral everywhere it is non-null; `ratio` is not.
    assert_eq!(rows[0]["uses"], json!(5));
    assert_eq!(rows[1]["uses"], json!(null));
    assert_eq!(rows[2]["uses"], json!(7));
    assert_eq!(rows[0]["ratio"], json!(1.5));
    assert_eq!(rows[1]["ratio"], json!(2.0));
}

#[test]
fn test_tabulate_column_order_is_first_seen() {
    let records = records_from(json!([
        {"client_id": "a", "namespace_id": "root", "client_type": "entity"},
        {"client_id": "b", "namespace_id": "root", "client_type": "entity", "mount_accessor": "auth_x"}
    ]));

    let (headers, _) = tabulate_records(&records).unwrap();
    assert_eq!(
        headers,
        [
            "client_id",
            "namespace_id",
            "client_type",
            "entity_type",
            "mount_accessor"
        ]
    );
}
