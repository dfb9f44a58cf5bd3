//! Command implementations.
//!
//! Each module implements one subcommand:
//!
//! - [`namespace_audit`] - concurrent walk of the namespace tree with
//!   JSON and CSV summary reports
//! - [`activity_export`] - per-period client activity counts flattened
//!   by namespace and mount
//! - [`entity_export`] - per-period client entity records tabulated to
//!   CSV
//!
//! The `all` subcommand chains the three `*_with_client` entry points
//! over a single validated connection.

pub mod activity_export;
pub mod entity_export;
pub mod namespace_audit;
