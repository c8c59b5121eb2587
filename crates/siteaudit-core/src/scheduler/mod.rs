//! Batch orchestration.
//!
//! Owns the two resources shared across probe tasks (the concurrency budget
//! and the rate throttle) and the run loop that ties target selection, the
//! fetch executor, the progress store, the result store and the quarantine
//! engine together.

mod batch;
mod budget;
mod error;
mod summary;
mod throttle;

pub use batch::{run_batch, BatchStores};
pub use budget::{BudgetSlot, ConcurrencyBudget};
pub use error::BatchError;
pub use summary::RunSummary;
pub use throttle::RateThrottle;
