//! Run reporting: the terminal-failure error log and summary rendering.

mod error_log;
mod render;

pub use error_log::{ErrorLog, ErrorLogLine, ERROR_LOG_FILE};
pub use render::render_summary;
