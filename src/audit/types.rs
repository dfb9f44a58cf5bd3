//! Containers for namespace audit results.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::vault_api::{MountMap, NamespaceInfo};

/// Everything the audit collected, keyed by canonical namespace path.
///
/// Canonical keys carry no trailing slash; the root namespace is the
/// empty string. A path present in `auth_methods` is also present in
/// `secret_engines` unless the corresponding listing failed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AuditData {
    /// Discovered namespaces: `path -> {id, custom_metadata}`.
    pub namespaces: BTreeMap<String, NamespaceInfo>,
    /// Auth backends per namespace: `path -> {mount_path -> info}`.
    pub auth_methods: BTreeMap<String, MountMap>,
    /// Secret backends per namespace, same shape as `auth_methods`.
    pub secret_engines: BTreeMap<String, MountMap>,
}

/// Counters reported at the end of an audit run.
#[derive(Debug, Default, Clone)]
pub struct AuditStats {
    pub processed_count: usize,
    pub error_count: usize,
    pub duration: Duration,
}

/// Result of a completed audit.
#[derive(Debug)]
pub struct AuditOutcome {
    pub data: AuditData,
    pub stats: AuditStats,
}
