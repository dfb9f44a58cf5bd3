//! # Vault Tools
//!
//! Command-line tools for auditing the namespace tree of a `HashiCorp
//! Vault` cluster and exporting client activity data.
//!
//! ## Overview
//!
//! Three tools share one Vault API client, error model, and output
//! convention:
//!
//! - **namespace-audit** - walks every namespace reachable from a
//!   starting path with a bounded pool of concurrent workers, recording
//!   each namespace together with its auth methods and secrets engines.
//!   Partial failures (denied branches, missing child listings) are
//!   counted and logged without aborting the walk.
//! - **activity-export** - fetches client activity counts for a billing
//!   period and flattens the per-namespace breakdown into CSV tables.
//! - **entity-export** - fetches the per-client activity export, which
//!   newer servers stream as NDJSON, and tabulates it.
//!
//! Reports land in the output directory as both canonical JSON and
//! flattened CSV, named `<cluster>-<kind>-<YYYYMMDD>.{json,csv}`.
//!
//! ## Configuration
//!
//! Connection settings come from the standard Vault environment
//! (`VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_SKIP_VERIFY`); tool behavior is
//! tuned through `VAULT_TOOLS_OUTPUT_DIR`, `VAULT_TOOLS_DEBUG`,
//! `VAULT_TOOLS_WORKERS`, `VAULT_TOOLS_RATE_LIMIT_BATCH`,
//! `VAULT_TOOLS_RATE_LIMIT_SLEEP`, `VAULT_TOOLS_NO_RATE_LIMIT`, and
//! `VAULT_TOOLS_TIMEOUT`.
//!
//! ## Architecture
//!
//! - [`vault_api`] - HTTP client, response decoding, error taxonomy
//! - [`audit`] - the concurrent namespace traversal and its summaries
//! - [`commands`] - one module per subcommand
//! - [`config`] - environment-derived configuration
//! - [`utils`] - report writing, formatting, date handling

pub mod audit;
pub mod commands;
pub mod config;
pub mod utils;
pub mod vault_api;
