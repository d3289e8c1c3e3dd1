use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect;
use serde::Serialize;

use crate::runner::{ScanConfig, ScanError};
use crate::target::ScanTarget;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// a single discovered path, as reported to sinks and exported
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub url: String,
    pub status_code: u16,
    pub content_length: usize,
    pub candidate: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Match(MatchRecord),
    NoMatch { url: String, status_code: u16 },
    TransportError { url: String, cause: String },
}

#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &ScanTarget, candidate: &str) -> ProbeOutcome;
}

pub fn classify(status_code: u16, match_codes: &HashSet<u16>) -> bool {
    match_codes.contains(&status_code)
}

fn default_headers(user_agent: &str) -> Result<HeaderMap, ScanError> {
    let mut headers = HeaderMap::new();
    let user_agent = if user_agent.trim().is_empty() {
        DEFAULT_USER_AGENT
    } else {
        user_agent
    };
    let ua = HeaderValue::from_str(user_agent).map_err(|_| ScanError::InvalidUserAgent {
        value: user_agent.to_string(),
    })?;
    headers.insert(header::USER_AGENT, ua);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    Ok(headers)
}

pub fn build_client(config: &ScanConfig) -> Result<reqwest::Client, ScanError> {
    let headers = default_headers(&config.user_agent)?;
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .timeout(config.timeout)
        .pool_max_idle_per_host(config.concurrency.max(1));

    if !config.verify_tls {
        builder = builder
            .danger_accept_invalid_hostnames(true)
            .danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ScanError::HttpClientBuild { source: e })
}

#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: reqwest::Client,
    match_codes: HashSet<u16>,
}

impl HttpProbe {
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        Ok(Self {
            client: build_client(config)?,
            match_codes: config.match_status_codes.clone(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &ScanTarget, candidate: &str) -> ProbeOutcome {
        let url = target.join(candidate);

        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return ProbeOutcome::TransportError {
                    url,
                    cause: e.to_string(),
                }
            }
        };

        let status_code = resp.status().as_u16();
        if !classify(status_code, &self.match_codes) {
            return ProbeOutcome::NoMatch { url, status_code };
        }

        // the body is read in full so the reported length matches what was served
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return ProbeOutcome::TransportError {
                    url,
                    cause: e.to_string(),
                }
            }
        };

        ProbeOutcome::Match(MatchRecord {
            url,
            status_code,
            content_length: body.len(),
            candidate: candidate.to_string(),
        })
    }
}
