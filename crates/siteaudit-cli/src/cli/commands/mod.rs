//! CLI command handlers. Each command is in its own file.

mod audit;
mod batch;
mod completions;
mod quarantine;
mod stats;

pub use audit::run_audit;
pub use batch::run_batch_command;
pub use completions::run_completions;
pub use quarantine::run_quarantine;
pub use stats::run_stats;

/// Score in [0, 1] as a 0-100 integer, the way reports show it.
pub(crate) fn pct(score: f64) -> u32 {
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}
