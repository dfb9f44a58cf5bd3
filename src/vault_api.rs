//! Vault API client.
//!
//! Thin wrapper around `reqwest` that issues authenticated requests against
//! the Vault HTTP API, decodes JSON or NDJSON bodies, and classifies
//! failures into the [`VaultError`] taxonomy shared by every command.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::VaultConfig;

/// Mount table for a single namespace: `"<mount_path>/" -> mount info`.
pub type MountMap = serde_json::Map<String, Value>;

/// Errors surfaced by the Vault client and the commands built on it.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("permission denied for {path}")]
    Permission { path: String },

    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("Vault API request to {path} failed with status {status}: {body}")]
    Api {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {path}: {reason}")]
    Data { path: String, reason: String },

    #[error("interrupted before traversal completed")]
    Interrupted,
}

/// Health endpoint payload, reduced to the fields the tools rely on.
#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub cluster_name: Option<String>,
}

/// Metadata Vault reports for a child namespace in `key_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub custom_metadata: Option<Value>,
}

/// Response of `sys/namespaces?list=true` for one namespace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceList {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub key_info: HashMap<String, NamespaceInfo>,
}

/// The listing operations the namespace auditor needs from a Vault server.
///
/// Implemented by [`VaultClient`]; tests substitute an in-memory tree.
#[async_trait]
pub trait NamespaceSource: Send + Sync {
    async fn list_auth_methods(&self, namespace: &str) -> Result<MountMap, VaultError>;
    async fn list_secrets_engines(&self, namespace: &str) -> Result<MountMap, VaultError>;
    async fn list_namespaces(&self, namespace: &str) -> Result<NamespaceList, VaultError>;
}

/// Vault API client.
#[derive(Debug, Clone)]
pub struct VaultClient {
    addr: String,
    token: String,
    client: Client,
}

impl VaultClient {
    /// Create a client from a validated configuration.
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        if config.vault_skip_verify {
            warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(config.vault_skip_verify)
            .timeout(config.timeout)
            .build()
            .map_err(|e| VaultError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            addr: config.vault_addr.trim_end_matches('/').to_string(),
            token: config.vault_token.clone(),
            client,
        })
    }

    /// The Vault server address, without a trailing slash.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Make a GET request to a Vault API endpoint (path without `/v1/`).
    ///
    /// `namespace` is sent as `X-Vault-Namespace` when non-empty, scoping
    /// the call the way the Vault CLI does.
    pub async fn get(
        &self,
        path: &str,
        params: Option<&[(&str, String)]>,
        namespace: &str,
    ) -> Result<Value, VaultError> {
        let url = format!("{}/v1/{}", self.addr, path.trim_start_matches('/'));
        debug!(%url, namespace, "GET");

        let mut request = self.client.get(&url).header("X-Vault-Token", &self.token);
        if !namespace.is_empty() {
            request = request.header("X-Vault-Namespace", namespace);
        }
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(path, &e))?;

        classify_status(path, status, &body)?;
        if body.trim().is_empty() {
            // 204 responses carry no body; callers treat this as no data.
            return Ok(Value::Object(serde_json::Map::new()));
        }
        decode_body(path, &body)
    }

    /// Make a POST request to a Vault API endpoint (path without `/v1/`).
    #[allow(dead_code)]
    pub async fn post(
        &self,
        path: &str,
        data: Option<&Value>,
        namespace: &str,
    ) -> Result<Value, VaultError> {
        let url = format!("{}/v1/{}", self.addr, path.trim_start_matches('/'));
        debug!(%url, namespace, "POST");

        let mut request = self.client.post(&url).header("X-Vault-Token", &self.token);
        if !namespace.is_empty() {
            request = request.header("X-Vault-Namespace", namespace);
        }
        if let Some(data) = data {
            request = request.json(data);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(path, &e))?;

        classify_status(path, status, &body)?;
        if body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        decode_body(path, &body)
    }

    /// Validate the connection and return the cluster name.
    ///
    /// The health endpoint is queried with every standby/sealed/uninit
    /// status mapped to 200 so that reachability and cluster state can be
    /// told apart. A sealed, unauthenticated, or uninitialised cluster is
    /// a hard error.
    pub async fn validate_connection(&self) -> Result<String, VaultError> {
        let params = [
            ("sealedcode", "200".to_string()),
            ("standbycode", "200".to_string()),
            ("performancestandbycode", "200".to_string()),
            ("uninitcode", "200".to_string()),
        ];
        let health_json = self.get("sys/health", Some(&params), "").await?;
        let health: HealthStatus = serde_json::from_value(health_json).map_err(|e| {
            VaultError::Data {
                path: "sys/health".to_string(),
                reason: e.to_string(),
            }
        })?;

        if health.sealed {
            return Err(VaultError::Connection(
                "Vault cluster is sealed. Unseal the cluster or check auto-unseal configuration"
                    .to_string(),
            ));
        }

        if let Err(e) = self.get("auth/token/lookup-self", None, "").await {
            return Err(VaultError::Connection(format!(
                "Vault client is not authenticated. Check VAULT_TOKEN and ensure the token has \
                 not expired or been revoked ({e})"
            )));
        }

        if !health.initialized {
            return Err(VaultError::Connection(
                "Vault cluster is not initialized".to_string(),
            ));
        }

        let cluster_name = health
            .cluster_name
            .unwrap_or_else(|| "unknown".to_string());
        info!(cluster = %cluster_name, "connected to Vault cluster");
        Ok(cluster_name)
    }

    async fn list_mounts(&self, path: &str, namespace: &str) -> Result<MountMap, VaultError> {
        let response = self.get(path, None, namespace).await?;
        Ok(mount_table(extract_data(response)))
    }
}

#[async_trait]
impl NamespaceSource for VaultClient {
    /// Auth backends mounted in `namespace`.
    async fn list_auth_methods(&self, namespace: &str) -> Result<MountMap, VaultError> {
        self.list_mounts("sys/auth", namespace).await
    }

    /// Secret backends mounted in `namespace`.
    async fn list_secrets_engines(&self, namespace: &str) -> Result<MountMap, VaultError> {
        self.list_mounts("sys/mounts", namespace).await
    }

    /// Direct child namespaces of `namespace`. 404 means no children.
    async fn list_namespaces(&self, namespace: &str) -> Result<NamespaceList, VaultError> {
        let params = [("list", "true".to_string())];
        let response = self.get("sys/namespaces", Some(&params), namespace).await?;
        serde_json::from_value(extract_data(response)).map_err(|e| VaultError::Data {
            path: "sys/namespaces".to_string(),
            reason: e.to_string(),
        })
    }
}

fn transport_error(path: &str, err: &reqwest::Error) -> VaultError {
    if err.is_timeout() {
        VaultError::Connection(format!("request timeout for {path}: {err}"))
    } else {
        VaultError::Connection(format!("request to {path} failed: {err}"))
    }
}

fn classify_status(path: &str, status: StatusCode, body: &str) -> Result<(), VaultError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::FORBIDDEN => Err(VaultError::Permission {
            path: path.to_string(),
        }),
        StatusCode::NOT_FOUND => Err(VaultError::NotFound {
            path: path.to_string(),
        }),
        _ => Err(VaultError::Api {
            path: path.to_string(),
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}

/// Decode a response body that is either a single JSON value or a stream
/// of newline-delimited values.
///
/// The decoder streams whole values off the payload instead of inspecting
/// parse error messages: one value decodes to itself, several decode to an
/// array, anything else is a data error.
pub fn decode_body(path: &str, body: &str) -> Result<Value, VaultError> {
    let mut values = Vec::new();
    for item in serde_json::Deserializer::from_str(body).into_iter::<Value>() {
        match item {
            Ok(value) => values.push(value),
            Err(e) => {
                return Err(VaultError::Data {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    if values.len() == 1 {
        Ok(values.remove(0))
    } else if values.is_empty() {
        Err(VaultError::Data {
            path: path.to_string(),
            reason: "empty response body".to_string(),
        })
    } else {
        Ok(Value::Array(values))
    }
}

/// Unwrap the `data` envelope Vault puts around most responses.
pub fn extract_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Reduce a mounts response to the `"<mount_path>/" -> info` table.
///
/// Older servers interleave request metadata with the mount entries, so
/// only `/`-terminated keys holding objects are kept.
fn mount_table(data: Value) -> MountMap {
    let mut mounts = MountMap::new();
    if let Value::Object(map) = data {
        for (key, value) in map {
            if key.ends_with('/') && value.is_object() {
                mounts.insert(key, value);
            }
        }
    }
    mounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_data_unwraps_envelope() {
        let value = json!({"request_id": "x", "data": {"kv/": {"type": "kv"}}});
        assert_eq!(extract_data(value), json!({"kv/": {"type": "kv"}}));
    }

    #[test]
    fn test_extract_data_passthrough_without_envelope() {
        let value = json!({"kv/": {"type": "kv"}});
        assert_eq!(extract_data(value.clone()), value);
    }

    #[test]
    fn test_mount_table_drops_metadata_keys() {
        let data = json!({
            "token/": {"type": "token"},
            "request_id": "abc",
            "lease_duration": 0
        });
        let mounts = mount_table(data);
        assert_eq!(mounts.len(), 1);
        assert!(mounts.contains_key("token/"));
    }

    #[test]
    fn test_decode_body_single_value() {
        let value = decode_body("sys/health", r#"{"sealed": false}"#).unwrap();
        assert_eq!(value, json!({"sealed": false}));
    }

    #[test]
    fn test_decode_body_ndjson() {
        let body = "{\"client_id\":\"a\"}\n{\"client_id\":\"b\"}\n";
        let value = decode_body("export", body).unwrap();
        assert_eq!(
            value,
            json!([{"client_id": "a"}, {"client_id": "b"}])
        );
    }

    #[test]
    fn test_decode_body_garbage() {
        assert!(matches!(
            decode_body("export", "not json"),
            Err(VaultError::Data { .. })
        ));
    }

    #[test]
    fn test_decode_body_empty() {
        assert!(matches!(
            decode_body("export", "  "),
            Err(VaultError::Data { .. })
        ));
    }
}
