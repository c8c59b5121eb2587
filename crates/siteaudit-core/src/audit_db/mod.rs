//! Persistent result and quarantine store (SQLite via sqlx).
//!
//! Holds raw audit payloads keyed by `(url, strategy, timestamp)`, the
//! derived `latest_scores` summary, and the quarantine table.

pub mod db;
pub mod quarantine;
pub mod results;
pub mod types;

pub use db::*;
pub use types::*;

#[cfg(test)]
mod tests;
