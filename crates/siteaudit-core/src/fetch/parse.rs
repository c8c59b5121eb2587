//! Parse a PageSpeed Insights v5 response into scores and web vitals.

use serde::Deserialize;
use std::collections::HashMap;

use crate::model::{Scores, WebVitals};
use crate::retry::{is_target_diagnostic, ProbeError};

/// Categories requested on every call; a reply must score each of them.
pub(crate) const CATEGORIES: [&str; 4] = ["performance", "accessibility", "seo", "best-practices"];

/// Extracted data of a successful response, plus the raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAudit {
    pub scores: Scores,
    pub vitals: WebVitals,
    pub raw: String,
}

#[derive(Deserialize)]
struct Response {
    #[serde(rename = "lighthouseResult")]
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Deserialize)]
struct LighthouseResult {
    #[serde(default)]
    categories: HashMap<String, Category>,
    #[serde(default)]
    audits: HashMap<String, Audit>,
    #[serde(rename = "runtimeError")]
    runtime_error: Option<RuntimeError>,
}

#[derive(Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Deserialize)]
struct Audit {
    #[serde(rename = "numericValue")]
    numeric_value: Option<f64>,
}

#[derive(Deserialize)]
struct RuntimeError {
    code: Option<String>,
    message: Option<String>,
}

fn score(categories: &HashMap<String, Category>, name: &str) -> Result<f64, ProbeError> {
    let value = categories
        .get(name)
        .and_then(|c| c.score)
        .ok_or_else(|| ProbeError::MalformedResponse(format!("missing {name} score")))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ProbeError::MalformedResponse(format!(
            "{name} score out of range: {value}"
        )));
    }
    Ok(value)
}

fn metric(audits: &HashMap<String, Audit>, name: &str) -> Option<f64> {
    audits.get(name).and_then(|a| a.numeric_value)
}

/// A 200 can still carry a Lighthouse runtime error about the probed site;
/// that is reported as `InvalidTarget`, anything unparsable as `MalformedResponse`.
pub fn parse_response(body: &str) -> Result<ParsedAudit, ProbeError> {
    let response: Response = serde_json::from_str(body)
        .map_err(|e| ProbeError::MalformedResponse(format!("invalid JSON: {e}")))?;
    let lh = response
        .lighthouse_result
        .ok_or_else(|| ProbeError::MalformedResponse("no lighthouseResult".into()))?;

    if let Some(err) = &lh.runtime_error {
        let code = err.code.as_deref().unwrap_or_default();
        let message = err.message.as_deref().unwrap_or_default();
        let text = format!("{code}: {message}");
        if is_target_diagnostic(&text) {
            return Err(ProbeError::InvalidTarget {
                status: None,
                message: text,
            });
        }
    }

    let scores = Scores {
        performance: score(&lh.categories, "performance")?,
        accessibility: score(&lh.categories, "accessibility")?,
        seo: score(&lh.categories, "seo")?,
        best_practices: score(&lh.categories, "best-practices")?,
    };
    let vitals = WebVitals {
        first_contentful_paint_ms: metric(&lh.audits, "first-contentful-paint"),
        largest_contentful_paint_ms: metric(&lh.audits, "largest-contentful-paint"),
        cumulative_layout_shift: metric(&lh.audits, "cumulative-layout-shift"),
        max_potential_fid_ms: metric(&lh.audits, "max-potential-fid"),
    };
    Ok(ParsedAudit {
        scores,
        vitals,
        raw: body.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn sample_body(performance: f64) -> String {
    serde_json::json!({
        "id": "https://www.example.gov/",
        "lighthouseResult": {
            "categories": {
                "performance": {"score": performance},
                "accessibility": {"score": 0.91},
                "seo": {"score": 0.83},
                "best-practices": {"score": 0.75}
            },
            "audits": {
                "first-contentful-paint": {"numericValue": 1834.5, "score": 0.8},
                "largest-contentful-paint": {"numericValue": 3120.0},
                "cumulative-layout-shift": {"numericValue": 0.04},
                "max-potential-fid": {"numericValue": 210.0}
            }
        }
    })
    .to_string()
}
