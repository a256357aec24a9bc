//! Core business logic - framework-agnostic store operations, summary maintenance,
//! aggregation and the PIN lifecycle.
//!
//! Store functions take the database handle explicitly; nothing here holds global state.

/// Period totals, breakdowns, ratios and dashboard views
pub mod analytics;
/// Export and import of full-store snapshots
pub mod backup;
/// PIN record lifecycle and strength assessment
pub mod pin;
/// User preferences blob
pub mod preferences;
/// Calendar-month report and its shareable text
pub mod report;
/// Daily summary maintenance and lookup
pub mod summary;
/// Transaction log: insert, query and delete
pub mod transaction;
