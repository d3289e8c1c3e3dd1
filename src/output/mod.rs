pub mod console;

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::probe::MatchRecord;
use crate::runner::{ScanState, ScanSummary};

/// `on_summary` is called exactly once per scan. `on_progress` is advisory.
pub trait ResultSink: Send + Sync {
    fn on_match(&self, record: &MatchRecord);

    fn on_progress(&self, dispatched: usize, total: usize);

    fn on_summary(&self, summary: &ScanSummary);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn on_match(&self, _record: &MatchRecord) {}

    fn on_progress(&self, _dispatched: usize, _total: usize) {}

    fn on_summary(&self, _summary: &ScanSummary) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportDocument {
    pub scan_time: String,
    pub target: String,
    pub state: ScanState,
    pub total_found: usize,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub elapsed_seconds: f64,
    pub results: Vec<MatchRecord>,
}

pub fn build_export(summary: &ScanSummary) -> ExportDocument {
    ExportDocument {
        scan_time: chrono::Local::now().to_rfc3339(),
        target: summary.target.clone(),
        state: summary.state,
        total_found: summary.total_found(),
        total_requests: summary.total_requests,
        successful_requests: summary.successful_requests,
        failed_requests: summary.failed_requests,
        elapsed_seconds: summary.elapsed_seconds(),
        results: summary.matches.clone(),
    }
}

pub fn render_text(doc: &ExportDocument) -> Vec<u8> {
    let mut out = String::new();
    for r in &doc.results {
        out.push_str(&r.url);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(doc: &ExportDocument) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(doc)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render(doc: &ExportDocument, format: OutputFormat) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(doc)),
        OutputFormat::Json => render_json(doc),
    }
}

pub async fn write_export(
    path: &str,
    format: OutputFormat,
    summary: &ScanSummary,
) -> Result<(), std::io::Error> {
    let rendered = render(&build_export(summary), format)?;
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await?;
    outfile.write_all(&rendered).await?;
    outfile.flush().await
}
