pub mod app;
pub mod cli;
pub mod config;
pub mod output;
pub mod probe;
pub mod runner;
pub mod target;
pub mod utils;

pub use output::{NullSink, ResultSink};
pub use probe::{HttpProbe, MatchRecord, Probe, ProbeOutcome};
pub use runner::{scan, Runner, ScanConfig, ScanError, ScanState, ScanSummary};
pub use target::{normalize, ScanTarget};

#[cfg(test)]
mod tests;
