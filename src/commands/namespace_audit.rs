//! Namespace audit command.
//!
//! Walks every namespace reachable from the starting path, collecting
//! auth methods and secrets engines along the way, and writes six report
//! files: three JSON maps plus three CSV summaries.
//!
//! # Usage
//!
//! ```bash
//! # Audit the whole cluster with the default worker pool
//! vault-tools namespace-audit
//!
//! # Audit a subtree with 8 workers and no rate limiting
//! vault-tools namespace-audit -n team-a/ -w 8 --fast
//! ```
//!
//! Requires `VAULT_ADDR` and `VAULT_TOKEN`. Per-namespace failures are
//! counted and logged without failing the run; an interrupt before the
//! queue drains aborts the run without writing reports.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::audit::summary::{mount_type_summary, namespace_summary};
use crate::audit::{AuditData, NamespaceAuditor};
use crate::config::{AuditOptions, GlobalConfig, VaultConfig};
use crate::utils::format::{format_number, format_seconds};
use crate::utils::output::{report_path, write_csv_records, write_json};
use crate::vault_api::{VaultClient, VaultError};

pub async fn run(
    global: &GlobalConfig,
    namespace: &str,
    workers: Option<usize>,
    fast: bool,
) -> Result<()> {
    let vault_config = VaultConfig::from_env()?;
    let client = VaultClient::new(&vault_config)?;
    let cluster_name = client.validate_connection().await?;

    audit_with_client(&client, &cluster_name, global, namespace, workers, fast).await
}

/// Run the audit against an already-validated client, so `all` can reuse
/// one connection across commands.
pub async fn audit_with_client(
    client: &VaultClient,
    cluster_name: &str,
    global: &GlobalConfig,
    namespace: &str,
    workers: Option<usize>,
    fast: bool,
) -> Result<()> {
    let mut options = AuditOptions::from_env()?;
    if let Some(workers) = workers {
        if workers == 0 {
            return Err(VaultError::Config("workers must be positive".to_string()).into());
        }
        options.worker_threads = workers;
    }
    if fast {
        options.rate_limit_disable = true;
    }

    info!(cluster = cluster_name, namespace = if namespace.is_empty() { "root" } else { namespace }, "starting namespace audit");

    let auditor = NamespaceAuditor::new(Arc::new(client.clone()), options);

    let shutdown = auditor.shutdown_handle();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, letting workers finish in-flight work");
            shutdown.request();
        }
    });

    let outcome = auditor.audit(namespace).await;
    signal_task.abort();
    let outcome = outcome?;

    write_reports(&global.output_dir, cluster_name, &outcome.data)?;

    info!(
        "audit finished: processed {} namespaces in {} with {} errors",
        format_number(outcome.stats.processed_count),
        format_seconds(outcome.stats.duration.as_secs_f64()),
        format_number(outcome.stats.error_count)
    );
    if outcome.stats.error_count > 0 {
        warn!(
            errors = outcome.stats.error_count,
            "some namespaces could not be fully audited, see the log for paths"
        );
    }

    Ok(())
}

fn write_reports(output_dir: &Path, cluster_name: &str, data: &AuditData) -> Result<()> {
    write_json(
        &report_path(output_dir, cluster_name, "namespaces", "json"),
        &data.namespaces,
    )?;
    write_json(
        &report_path(output_dir, cluster_name, "auth-methods", "json"),
        &data.auth_methods,
    )?;
    write_json(
        &report_path(output_dir, cluster_name, "secrets-engines", "json"),
        &data.secret_engines,
    )?;

    let (headers, rows) = namespace_summary(&data.namespaces);
    write_csv_records(
        &report_path(output_dir, cluster_name, "summary-namespaces", "csv"),
        &headers,
        &rows,
    )?;

    let (headers, rows) = mount_type_summary(&data.auth_methods);
    write_csv_records(
        &report_path(output_dir, cluster_name, "summary-auth-methods", "csv"),
        &headers,
        &rows,
    )?;

    let (headers, rows) = mount_type_summary(&data.secret_engines);
    write_csv_records(
        &report_path(output_dir, cluster_name, "summary-secrets-engines", "csv"),
        &headers,
        &rows,
    )?;

    Ok(())
}
