use std::fmt;

use crate::runner::ScanError;

/// A validated base URL: http(s) scheme, non-empty host, optional path prefix,
/// never a trailing slash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanTarget {
    base: String,
}

impl ScanTarget {
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Joins a candidate onto the base with exactly one separating slash.
    pub fn join(&self, candidate: &str) -> String {
        let candidate = candidate.trim().trim_start_matches('/');
        format!("{}/{}", self.base, candidate)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// a "://" only names a scheme when nothing path-like comes before it
fn explicit_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    if scheme.contains(['/', '?', '#']) {
        return None;
    }
    Some(scheme)
}

pub fn normalize(raw: &str) -> Result<ScanTarget, ScanError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ScanError::InvalidTarget {
        url: raw.to_string(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("empty URL".to_string()));
    }

    let with_scheme = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(scheme) = explicit_scheme(trimmed) {
        return Err(invalid(format!("unsupported scheme '{scheme}'")));
    } else {
        format!("http://{trimmed}")
    };

    let mut parsed = reqwest::Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(invalid("missing host".to_string())),
    }
    parsed.set_query(None);
    parsed.set_fragment(None);

    let mut base = parsed.to_string();
    while base.ends_with('/') {
        base.pop();
    }
    Ok(ScanTarget { base })
}
