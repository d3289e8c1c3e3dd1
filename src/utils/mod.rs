use std::collections::HashSet;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::runner::ScanError;

pub fn parse_u16_set_csv(value: &str) -> Result<HashSet<u16>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("list is empty".to_string());
    }
    let mut out = HashSet::new();
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let code: u16 = item
            .parse()
            .map_err(|_| format!("invalid status code '{item}'"))?;
        if !(100..=599).contains(&code) {
            return Err(format!("status code out of range '{item}'"));
        }
        out.insert(code);
    }
    if out.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_delay_seconds(value: f64) -> Result<Duration, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid delay '{value}', expected a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f64(value))
}

pub fn wordlist_entry(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed)
}

pub async fn load_wordlist(path: &str) -> Result<Vec<String>, ScanError> {
    let path = crate::config::expand_tilde_string(path);
    let handle = File::open(&path).await.map_err(|e| ScanError::FileOpen {
        kind: "wordlist",
        path: path.clone(),
        source: e,
    })?;
    let mut out = Vec::new();
    let mut lines = BufReader::new(handle).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(entry) = wordlist_entry(&line) {
                    out.push(entry.to_string());
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Err(ScanError::FileRead {
                    kind: "wordlist",
                    path,
                    source: e,
                })
            }
        }
    }
    log::debug!("loaded {} candidates from {}", out.len(), path);
    Ok(out)
}

pub fn format_status_codes(codes: &HashSet<u16>) -> String {
    let mut sorted: Vec<u16> = codes.iter().copied().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
