//! Scoring API client.
//!
//! Uses the curl crate (libcurl) for one GET per `(url, strategy)`.
//! Calls block; the executor runs them in `spawn_blocking`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::model::Strategy;
use crate::retry::{classify_http_status, ProbeError};

use super::parse::CATEGORIES;

/// One blocking call to the scoring API.
pub trait ScoringApi: Send + Sync + 'static {
    /// Returns the raw body of a 2xx response; any other outcome is classified.
    fn run_audit(&self, url: &str, strategy: Strategy) -> Result<String, ProbeError>;
}

/// libcurl-backed client for the PageSpeed Insights v5 endpoint.
#[derive(Debug, Clone)]
pub struct CurlScoringApi {
    endpoint: url::Url,
    api_key: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl CurlScoringApi {
    pub fn new(api: &ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = url::Url::parse(&api.endpoint)
            .with_context(|| format!("invalid API endpoint: {}", api.endpoint))?;
        Ok(Self {
            endpoint,
            api_key: api_key.into(),
            timeout: Duration::from_secs(api.timeout_secs.max(1)),
            connect_timeout: Duration::from_secs(api.connect_timeout_secs.max(1)),
        })
    }

    /// Full request URL. Contains the API key; never log it.
    fn request_url(&self, url: &str, strategy: Strategy) -> url::Url {
        let mut request = self.endpoint.clone();
        {
            let mut q = request.query_pairs_mut();
            q.append_pair("url", url);
            q.append_pair("key", &self.api_key);
            q.append_pair("strategy", strategy.as_str());
            for c in CATEGORIES {
                q.append_pair("category", c);
            }
        }
        request
    }
}

impl ScoringApi for CurlScoringApi {
    fn run_audit(&self, url: &str, strategy: Strategy) -> Result<String, ProbeError> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(self.request_url(url, strategy).as_str())?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.useragent(concat!("siteaudit/", env!("CARGO_PKG_VERSION")))?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        let text = String::from_utf8_lossy(&body).into_owned();
        if (200..300).contains(&code) {
            return Ok(text);
        }
        let status = u16::try_from(code).unwrap_or(0);
        Err(classify_http_status(status, &error_message(&text)))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Machine-readable message from a Google API error body, or the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ => {
            let trimmed = body.trim();
            trimmed.chars().take(300).collect()
        }
    }
}
