//! Environment-derived configuration.
//!
//! All tools read their connection settings from the standard Vault
//! environment variables (`VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_SKIP_VERIFY`)
//! plus a `VAULT_TOOLS_*` family for tool behavior.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::vault_api::VaultError;

pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_RATE_LIMIT_BATCH_SIZE: usize = 100;
pub const DEFAULT_RATE_LIMIT_SLEEP_SECONDS: u64 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Connection settings for the Vault server.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub vault_addr: String,
    pub vault_token: String,
    pub vault_skip_verify: bool,
    pub timeout: Duration,
}

impl VaultConfig {
    /// Build the connection config from the environment.
    ///
    /// `VAULT_ADDR` and `VAULT_TOKEN` are required; the error names every
    /// missing variable so the operator can fix them in one pass.
    pub fn from_env() -> Result<Self, VaultError> {
        let vault_addr = env::var("VAULT_ADDR").unwrap_or_default();
        let vault_token = env::var("VAULT_TOKEN").unwrap_or_default();

        let mut missing = Vec::new();
        if vault_addr.is_empty() {
            missing.push("VAULT_ADDR");
        }
        if vault_token.is_empty() {
            missing.push("VAULT_TOKEN");
        }
        if !missing.is_empty() {
            return Err(VaultError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let timeout_seconds = env_positive_u64("VAULT_TOOLS_TIMEOUT", DEFAULT_TIMEOUT_SECONDS)?;

        Ok(Self {
            vault_addr,
            vault_token,
            vault_skip_verify: env_flag("VAULT_SKIP_VERIFY"),
            timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub output_dir: PathBuf,
    pub debug: bool,
}

impl GlobalConfig {
    pub fn from_env() -> Self {
        Self {
            output_dir: PathBuf::from(
                env::var("VAULT_TOOLS_OUTPUT_DIR")
                    .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            debug: env_flag("VAULT_TOOLS_DEBUG"),
        }
    }
}

/// Tuning knobs for the namespace audit traversal.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub worker_threads: usize,
    pub rate_limit_batch_size: usize,
    pub rate_limit_sleep: Duration,
    pub rate_limit_disable: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            rate_limit_batch_size: DEFAULT_RATE_LIMIT_BATCH_SIZE,
            rate_limit_sleep: Duration::from_secs(DEFAULT_RATE_LIMIT_SLEEP_SECONDS),
            rate_limit_disable: false,
        }
    }
}

impl AuditOptions {
    /// Build audit options from the environment.
    pub fn from_env() -> Result<Self, VaultError> {
        let worker_threads =
            env_positive_usize("VAULT_TOOLS_WORKERS", DEFAULT_WORKER_THREADS)?;
        let rate_limit_batch_size = env_positive_usize(
            "VAULT_TOOLS_RATE_LIMIT_BATCH",
            DEFAULT_RATE_LIMIT_BATCH_SIZE,
        )?;
        let sleep_seconds = env_positive_u64(
            "VAULT_TOOLS_RATE_LIMIT_SLEEP",
            DEFAULT_RATE_LIMIT_SLEEP_SECONDS,
        )?;

        Ok(Self {
            worker_threads,
            rate_limit_batch_size,
            rate_limit_sleep: Duration::from_secs(sleep_seconds),
            rate_limit_disable: env_flag("VAULT_TOOLS_NO_RATE_LIMIT"),
        })
    }
}

/// Normalize a namespace path argument: non-empty paths end with `/`,
/// a bare `/` means the root.
pub fn normalize_namespace_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return String::new();
    }
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// True when the variable is set to a truthy value (`1`, `true`, `yes`).
fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

fn env_positive_usize(name: &str, default: usize) -> Result<usize, VaultError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let parsed: usize = raw.parse().map_err(|_| {
                VaultError::Config(format!("{name} must be an integer (got '{raw}')"))
            })?;
            if parsed == 0 {
                return Err(VaultError::Config(format!(
                    "{name} must be positive (got {parsed})"
                )));
            }
            Ok(parsed)
        }
    }
}

fn env_positive_u64(name: &str, default: u64) -> Result<u64, VaultError> {
    env_positive_usize(name, default as usize).map(|v| v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("Yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("on"));
    }

    #[test]
    fn test_normalize_namespace_path() {
        assert_eq!(normalize_namespace_path(""), "");
        assert_eq!(normalize_namespace_path("/"), "");
        assert_eq!(normalize_namespace_path("team-a"), "team-a/");
        assert_eq!(normalize_namespace_path("team-a/"), "team-a/");
        assert_eq!(normalize_namespace_path("team-a/sub"), "team-a/sub/");
    }

    #[test]
    fn test_audit_options_defaults() {
        let options = AuditOptions::default();
        assert_eq!(options.worker_threads, 4);
        assert_eq!(options.rate_limit_batch_size, 100);
        assert_eq!(options.rate_limit_sleep, Duration::from_secs(3));
        assert!(!options.rate_limit_disable);
    }
}
