//! Scans a target from library code with a sink that prints matches as they arrive.
//!
//! ```text
//! cargo run --example library_scan -- http://127.0.0.1:8000 admin login backup
//! ```

use std::sync::Arc;

use dirforcer::output::ResultSink;
use dirforcer::{normalize, MatchRecord, Runner, ScanConfig, ScanSummary};

struct PrintSink;

impl ResultSink for PrintSink {
    fn on_match(&self, record: &MatchRecord) {
        println!("{} [{}] {} bytes", record.url, record.status_code, record.content_length);
    }

    fn on_progress(&self, _dispatched: usize, _total: usize) {}

    fn on_summary(&self, summary: &ScanSummary) {
        println!(
            "{:?}: {} found, {} requests in {:.2}s",
            summary.state,
            summary.total_found(),
            summary.total_requests,
            summary.elapsed_seconds()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let mut candidates: Vec<String> = args.collect();
    if candidates.is_empty() {
        candidates = vec!["admin".into(), "login".into(), "robots.txt".into()];
    }

    let config = ScanConfig {
        concurrency: 4,
        ..ScanConfig::default()
    };
    let target = normalize(&url)?;
    let runner = Runner::new(config)?;
    let summary = runner.run(&target, candidates, Arc::new(PrintSink)).await?;
    for record in &summary.matches {
        println!("  {}", record.candidate);
    }
    Ok(())
}
