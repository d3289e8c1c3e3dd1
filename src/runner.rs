use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::output::ResultSink;
use crate::probe::{HttpProbe, MatchRecord, Probe, ProbeOutcome, DEFAULT_USER_AGENT};
use crate::target::{self, ScanTarget};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_PROGRESS_EVERY: usize = 10;
pub const DEFAULT_STATUS_CODES: [u16; 5] = [200, 301, 302, 403, 401];

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub concurrency: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub user_agent: String,
    pub match_status_codes: HashSet<u16>,
    pub progress_every: usize,
    pub rate: Option<u32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            verify_tls: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            match_status_codes: DEFAULT_STATUS_CODES.into_iter().collect(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            rate: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("wordlist is empty (no usable candidates)")]
    EmptyWordlist,

    #[error("failed to open file for {kind}: {path}: {source}")]
    FileOpen {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read lines for {kind}: {path}: {source}")]
    FileRead {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid user agent {value:?}")]
    InvalidUserAgent { value: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("task join failed: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct ScanSummary {
    pub target: String,
    pub state: ScanState,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub elapsed: Duration,
    pub matches: Vec<MatchRecord>,
}

impl ScanSummary {
    pub fn total_found(&self) -> usize {
        self.matches.len()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
    started_at: Instant,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    matches: Vec<MatchRecord>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            started_at: Instant::now(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            matches: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.state = ScanState::Running;
        self.started_at = Instant::now();
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests
    }

    pub fn record(&mut self, outcome: ProbeOutcome) -> Option<&MatchRecord> {
        self.total_requests += 1;
        match outcome {
            ProbeOutcome::Match(record) => {
                self.successful_requests += 1;
                log::debug!("match {} ({})", record.url, record.status_code);
                self.matches.push(record);
                self.matches.last()
            }
            ProbeOutcome::NoMatch { url, status_code } => {
                self.failed_requests += 1;
                log::debug!("no match {url} ({status_code})");
                None
            }
            ProbeOutcome::TransportError { url, cause } => {
                self.failed_requests += 1;
                log::debug!("request to {url} failed: {cause}");
                None
            }
        }
    }

    pub fn finish(mut self, target: &ScanTarget, state: ScanState) -> ScanSummary {
        self.state = state;
        ScanSummary {
            target: target.to_string(),
            state: self.state,
            total_requests: self.total_requests,
            successful_requests: self.successful_requests,
            failed_requests: self.failed_requests,
            elapsed: self.started_at.elapsed(),
            matches: self.matches,
        }
    }
}

// hands out candidates in wordlist order, each one exactly once
struct WorkQueue {
    candidates: Vec<String>,
    next: AtomicUsize,
    dispatched: AtomicUsize,
}

impl WorkQueue {
    fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            next: AtomicUsize::new(0),
            dispatched: AtomicUsize::new(0),
        }
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn claim(&self) -> Option<&str> {
        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        self.candidates.get(idx).map(|c| c.as_str())
    }

    // a claimed candidate only counts once its request is about to go out
    fn mark_dispatched(&self) -> usize {
        self.dispatched.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

struct WorkerContext<P: ?Sized> {
    probe: Arc<P>,
    target: ScanTarget,
    queue: Arc<WorkQueue>,
    sink: Arc<dyn ResultSink>,
    cancel: CancellationToken,
    limiter: Option<Arc<DirectLimiter>>,
    delay: Duration,
    progress_every: usize,
    last_progress: Mutex<usize>,
}

impl<P: ?Sized> WorkerContext<P> {
    fn report_progress(&self, dispatched: usize) {
        if dispatched % self.progress_every != 0 {
            return;
        }
        // advisory: skip rather than wait when another worker is reporting
        if let Ok(mut last) = self.last_progress.try_lock() {
            if dispatched > *last {
                *last = dispatched;
                self.sink.on_progress(dispatched, self.queue.len());
            }
        }
    }
}

async fn wait_for_turn(limiter: Option<&DirectLimiter>, delay: Duration) {
    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

async fn run_worker<P: Probe + ?Sized>(ctx: Arc<WorkerContext<P>>, tx: mpsc::Sender<ProbeOutcome>) {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let Some(candidate) = ctx.queue.claim() else {
            break;
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                log::debug!("cancelled before dispatching {candidate}");
                break;
            }
            _ = wait_for_turn(ctx.limiter.as_deref(), ctx.delay) => {}
        }

        let dispatched = ctx.queue.mark_dispatched();
        ctx.report_progress(dispatched);

        let outcome = ctx.probe.probe(&ctx.target, candidate).await;
        if tx.send(outcome).await.is_err() {
            break;
        }
    }
}

fn build_limiter(rate: Option<u32>) -> Option<Arc<DirectLimiter>> {
    let rate = NonZeroU32::new(rate?)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_second(rate))))
}

pub struct Runner<P = HttpProbe> {
    config: ScanConfig,
    probe: Arc<P>,
    cancel: CancellationToken,
}

impl Runner<HttpProbe> {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let probe = HttpProbe::new(&config)?;
        Ok(Self::with_probe(config, probe))
    }
}

impl<P: Probe + 'static> Runner<P> {
    pub fn with_probe(config: ScanConfig, probe: P) -> Self {
        Self {
            config,
            probe: Arc::new(probe),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(
        &self,
        target: &ScanTarget,
        candidates: Vec<String>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<ScanSummary, ScanError> {
        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(ScanError::EmptyWordlist);
        }

        let total = candidates.len();
        let worker_count = self.config.concurrency.max(1).min(total);
        let mut session = ScanSession::new();
        session.start();
        log::info!(
            "scan started: target={} candidates={} workers={} delay={:?} timeout={:?}",
            target,
            total,
            worker_count,
            self.config.delay,
            self.config.timeout
        );

        let queue = Arc::new(WorkQueue::new(candidates));
        let ctx = Arc::new(WorkerContext {
            probe: Arc::clone(&self.probe),
            target: target.clone(),
            queue: Arc::clone(&queue),
            sink: Arc::clone(&sink),
            cancel: self.cancel.clone(),
            limiter: build_limiter(self.config.rate),
            delay: self.config.delay,
            progress_every: self.config.progress_every.max(1),
            last_progress: Mutex::new(0),
        });

        let (tx, mut rx) = mpsc::channel::<ProbeOutcome>(worker_count);
        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            workers.push(task::spawn(run_worker(Arc::clone(&ctx), tx.clone())));
        }
        drop(tx);

        while let Some(outcome) = rx.recv().await {
            if let Some(record) = session.record(outcome) {
                sink.on_match(record);
            }
        }

        let mut join_error = None;
        for joined in join_all(workers).await {
            if let Err(e) = joined {
                log::error!("scan worker failed: {e}");
                if join_error.is_none() {
                    join_error = Some(e);
                }
            }
        }

        let state = if queue.dispatched() < total {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        let summary = session.finish(target, state);
        log::info!(
            "scan {:?}: total={} successful={} failed={} elapsed={:.2}s",
            summary.state,
            summary.total_requests,
            summary.successful_requests,
            summary.failed_requests,
            summary.elapsed_seconds()
        );
        sink.on_summary(&summary);

        match join_error {
            Some(e) => Err(ScanError::TaskJoin { source: e }),
            None => Ok(summary),
        }
    }
}

pub async fn scan(
    raw_url: &str,
    candidates: Vec<String>,
    config: ScanConfig,
    sink: Arc<dyn ResultSink>,
) -> Result<ScanSummary, ScanError> {
    let target = target::normalize(raw_url)?;
    let runner = Runner::new(config)?;
    runner.run(&target, candidates, sink).await
}
