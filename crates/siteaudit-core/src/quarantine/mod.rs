//! Endpoint quarantine: failure-streak tracking and operator workflow.
//!
//! Streaks are counted in UTC calendar days. Days with no attempt do not
//! break a streak; a single success on the latest observed day resets it.
//! Statuses only change through [`transition`].

mod engine;
mod entry;
mod observe;
mod status;

pub use engine::{QuarantineChanges, QuarantineEngine, Reevaluation};
pub use entry::QuarantineEntry;
pub use observe::{DayVerdict, Observations};
pub use status::{transition, Next, QuarantineStatus, TransitionError, Trigger};
