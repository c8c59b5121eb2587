//! Parse the tabular target list (CSV with a header row).
//!
//! Columns are matched case-insensitively by substring: the url column is
//! anything `url`/`address`/`site`-like, the auxiliary id is `id`/`code`-like
//! and the optional region label is `region`/`state`/`uf`-like.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::model::Target;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Columns {
    pub url: usize,
    pub id: Option<usize>,
    pub region: Option<usize>,
}

/// Read and parse a target list file. An unreadable file is fatal.
pub fn load_targets(path: &Path) -> Result<Vec<Target>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read target list: {}", path.display()))?;
    parse_targets(&text).with_context(|| format!("parse target list: {}", path.display()))
}

/// Parse target rows. Malformed rows are skipped with a warning; duplicate
/// urls keep their first occurrence.
pub fn parse_targets(text: &str) -> Result<Vec<Target>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        bail!("target list is empty");
    };
    let delimiter = detect_delimiter(header);
    let headers = split_row(header, delimiter);
    let cols = resolve_columns(&headers)?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields = split_row(line, delimiter);
        let Some(raw_url) = fields.get(cols.url).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            tracing::warn!(line = line_no, "skipping row without url");
            continue;
        };
        let Some(url) = normalize_url(raw_url) else {
            tracing::warn!(line = line_no, url = raw_url, "skipping row with invalid url");
            continue;
        };
        if !seen.insert(url.clone()) {
            tracing::debug!(line = line_no, url = %url, "skipping duplicate url");
            continue;
        }
        let pick = |col: Option<usize>| {
            col.and_then(|c| fields.get(c))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        out.push(Target {
            url,
            auxiliary_id: pick(cols.id),
            region_label: pick(cols.region),
        });
    }
    tracing::info!("loaded {} valid targets", out.len());
    Ok(out)
}

/// Accept only absolute http(s) urls with a host.
pub fn normalize_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().filter(|h| !h.is_empty())?;
    Some(raw.to_string())
}

fn detect_delimiter(header: &str) -> char {
    [',', ';', '\t']
        .into_iter()
        .max_by_key(|d| header.matches(*d).count())
        .filter(|d| header.contains(*d))
        .unwrap_or(',')
}

fn find_column(lower: &[String], exclude: &[usize], pred: impl Fn(&str) -> bool) -> Option<usize> {
    lower
        .iter()
        .enumerate()
        .find(|(i, h)| !exclude.contains(i) && pred(h.as_str()))
        .map(|(i, _)| i)
}

pub(crate) fn resolve_columns(headers: &[String]) -> Result<Columns> {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let url = find_column(&lower, &[], |h| h.contains("url"))
        .or_else(|| find_column(&lower, &[], |h| h.contains("address") || h.contains("endereco")))
        .or_else(|| find_column(&lower, &[], |h| h.contains("site")));
    let Some(url) = url else {
        bail!("no url column in header: {}", headers.join(", "));
    };

    let id = find_column(&lower, &[url], |h| {
        h == "id"
            || h.starts_with("id_")
            || h.ends_with("_id")
            || h.contains("code")
            || h.contains("codigo")
            || h.contains("ibge")
    });
    let mut taken = vec![url];
    taken.extend(id);
    let region = find_column(&lower, &taken, |h| {
        h == "uf" || h.contains("region") || h.contains("state") || h.contains("estado")
    });

    Ok(Columns { url, id, region })
}

/// Split one CSV row, honouring double quotes and `""` escapes.
pub(crate) fn split_row(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut cur)),
            c => cur.push(c),
        }
    }
    fields.push(cur);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_columns_case_insensitively() {
        let c = resolve_columns(&headers(&["Nome", "Codigo_IBGE", "UF", "Site_URL"])).unwrap();
        assert_eq!(c.url, 3);
        assert_eq!(c.id, Some(1));
        assert_eq!(c.region, Some(2));
    }

    #[test]
    fn cidade_is_not_mistaken_for_id() {
        let c = resolve_columns(&headers(&["cidade", "url"])).unwrap();
        assert_eq!(c.url, 1);
        assert_eq!(c.id, None);
    }

    #[test]
    fn missing_url_column_is_an_error() {
        assert!(resolve_columns(&headers(&["name", "id"])).is_err());
    }

    #[test]
    fn split_row_handles_quotes() {
        let f = split_row(r#"1,"Sao Paulo, SP","say ""hi""",https://x.gov.br"#, ',');
        assert_eq!(f, vec!["1", "Sao Paulo, SP", "say \"hi\"", "https://x.gov.br"]);
    }

    #[test]
    fn parse_skips_malformed_and_duplicate_rows() {
        let text = "id,url,uf\n\
                    3550308,https://www.capital.sp.gov.br,SP\n\
                    1,,RJ\n\
                    2,not a url,MG\n\
                    4,ftp://files.gov.br,BA\n\
                    3550308,https://www.capital.sp.gov.br,SP\n\
                    5,https://prefeitura.rio,RJ\n";
        let targets = parse_targets(text).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "https://www.capital.sp.gov.br");
        assert_eq!(targets[0].auxiliary_id.as_deref(), Some("3550308"));
        assert_eq!(targets[0].region_label.as_deref(), Some("SP"));
        assert_eq!(targets[1].url, "https://prefeitura.rio");
    }

    #[test]
    fn parse_detects_semicolon_delimiter_and_bom() {
        let text = "\u{feff}codigo;endereco_site\n42;https://a.gov.br\n";
        let targets = parse_targets(text).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].auxiliary_id.as_deref(), Some("42"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_targets("\n\n").is_err());
    }
}
