//! Fetch executor: scoring API client, response parsing and the
//! bounded, throttled, retrying probe.

mod client;
mod executor;
mod parse;

pub use client::{CurlScoringApi, ScoringApi};
pub use executor::FetchExecutor;
pub use parse::{parse_response, ParsedAudit};

#[cfg(test)]
pub(crate) use parse::sample_body;
