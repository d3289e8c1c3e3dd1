use std::collections::BTreeMap;
use std::time::Duration;

use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::ResultSink;
use crate::probe::MatchRecord;
use crate::runner::{ScanState, ScanSummary};

// progress bar on stderr, findings and the final report printed above it
pub struct ConsoleSink {
    pb: ProgressBar,
}

impl ConsoleSink {
    pub fn new(total: usize) -> Result<Self, String> {
        let pb = ProgressBar::new(total.max(1) as u64);
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.enable_steady_tick(Duration::from_millis(200));
        pb.set_style(
            ProgressStyle::with_template(
                ":: Progress: [{bar:40.cyan/blue}] {percent}% ({pos}/{len}) :: {per_sec} :: Duration: [{elapsed_precise}]",
            )
            .map_err(|e| format!("failed to build progress bar style: {e}"))?
            .progress_chars("#>-"),
        );
        Ok(Self { pb })
    }

    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.pb.println(line);
    }
}

pub fn status_color(status_code: u16) -> Color {
    match status_code {
        200 => Color::Green,
        301 | 302 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn group_by_status(matches: &[MatchRecord]) -> BTreeMap<u16, Vec<&MatchRecord>> {
    let mut groups: BTreeMap<u16, Vec<&MatchRecord>> = BTreeMap::new();
    for m in matches {
        groups.entry(m.status_code).or_default().push(m);
    }
    groups
}

fn state_label(state: ScanState) -> &'static str {
    match state {
        ScanState::Idle => "idle",
        ScanState::Running => "running",
        ScanState::Completed => "completed",
        ScanState::Cancelled => "cancelled",
    }
}

impl ResultSink for ConsoleSink {
    fn on_match(&self, record: &MatchRecord) {
        self.pb.println(format!(
            "{} {} ({})",
            "[+] found:".bold().green(),
            record.url.bold().blue(),
            record.status_code.to_string().color(status_color(record.status_code)),
        ));
    }

    fn on_progress(&self, dispatched: usize, _total: usize) {
        self.pb.set_position(dispatched as u64);
    }

    fn on_summary(&self, summary: &ScanSummary) {
        self.pb.finish_and_clear();

        println!();
        println!("{}", "=== SCAN RESULTS ===".bold().green());
        let cyan = |label: &str, value: String| {
            println!("{}", format!(":: {:<20}: {}", label, value).cyan());
        };
        cyan("State", state_label(summary.state).to_string());
        cyan("Entries found", summary.total_found().to_string());
        cyan("Total requests", summary.total_requests.to_string());
        cyan("Successful requests", summary.successful_requests.to_string());
        cyan("Failed requests", summary.failed_requests.to_string());
        cyan("Elapsed", format!("{:.2}s", summary.elapsed_seconds()));

        if summary.matches.is_empty() {
            return;
        }
        println!();
        println!("{}", "Found entries:".bold().green());
        for (status_code, group) in group_by_status(&summary.matches) {
            println!();
            println!(
                "{}",
                format!("[{}] - {} entries:", status_code, group.len())
                    .color(status_color(status_code))
            );
            for m in group {
                println!("  {} ({} bytes)", m.url, m.content_length);
            }
        }
    }
}
