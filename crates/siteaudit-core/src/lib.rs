pub mod audit_db;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod progress;
pub mod quarantine;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod targets;
