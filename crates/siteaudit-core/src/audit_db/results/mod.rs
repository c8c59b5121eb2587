//! Audit results: idempotent insert and dashboard queries.

mod read;
mod write;
