//! Namespace audit engine.
//!
//! Walks the namespace tree of a Vault cluster breadth-first with a
//! bounded worker pool, collecting every namespace together with its auth
//! methods and secrets engines, and summarises the result into JSON and
//! CSV reports.
//!
//! - [`types`] - audit result containers and statistics
//! - [`traversal`] - the concurrent tree walk
//! - [`summary`] - CSV summary tables

pub mod summary;
pub mod traversal;
pub mod types;

pub use traversal::{NamespaceAuditor, ShutdownHandle};
pub use types::{AuditData, AuditOutcome, AuditStats};
