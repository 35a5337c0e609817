use crate::config::ScanConfig;
use crate::report::{Report, summarize};
use chrono::Utc;
use delver_scanner::error::Result;
use delver_scanner::{
    AggregateState, Aggregator, Classification, Dispatcher, HttpRequester, OutcomeCallback, RateLimiter,
    RequestOutcome, build_client,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Options for a scan beyond the run configuration itself
pub struct ScanOptions {
    pub show_progress_bar: bool,
    pub cancel: CancellationToken,
    /// Base delay for retry backoff; doubles on each attempt
    pub backoff_base: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            show_progress_bar: false,
            cancel: CancellationToken::new(),
            backoff_base: delver_scanner::requester::DEFAULT_BACKOFF_BASE,
        }
    }
}

/// Execute a full scan: validate, load candidates, probe them all and summarize.
///
/// Configuration and candidate-source errors are returned before any probe is issued.
/// Per-candidate failures only show up in the report counters.
pub async fn execute_scan(config: &ScanConfig, options: ScanOptions) -> Result<Report> {
    let ScanOptions {
        show_progress_bar,
        cancel,
        backoff_base,
    } = options;

    config.validate()?;
    let client = build_client(&config.client_settings())?;
    let limiter = Arc::new(RateLimiter::from_option(config.rate_limit)?);

    let source = config.candidate_source()?;
    let candidates = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Interrupted while loading candidates from {}", source);
            return Ok(summarize(&AggregateState::default(), Duration::ZERO)
                .with_started_at(Utc::now())
                .with_interrupted(true));
        }
        loaded = source.load(config.timeout) => loaded?,
    };
    if candidates.is_empty() {
        warn!("Candidate source is empty, nothing to probe");
    }

    info!(
        "Probing {} candidates against {} (concurrency {}, retries {}, rate {})",
        candidates.len(),
        config.base_url,
        config.concurrency,
        config.max_retries,
        config
            .rate_limit
            .map(|r| format!("{}/s", r))
            .unwrap_or_else(|| "unlimited".to_string())
    );

    let progress_bar = if show_progress_bar {
        let pb = ProgressBar::new(candidates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let aggregator = Arc::new(Aggregator::new());
    let requester = Arc::new(
        HttpRequester::new(client, aggregator.clone(), config.max_retries)
            .with_rate_limiter(limiter)
            .with_backoff_base(backoff_base),
    );

    let discovered_count = Arc::new(AtomicUsize::new(0));
    let verbose = config.verbose;
    let pb_clone = progress_bar.clone();
    let outcome_callback: OutcomeCallback = Arc::new(
        move |url: &str, outcome: &RequestOutcome, classification: Classification| {
            if verbose {
                match pb_clone {
                    Some(ref pb) => pb.suspend(|| log_outcome(url, outcome, classification)),
                    None => log_outcome(url, outcome, classification),
                }
            }
            if let Some(ref pb) = pb_clone {
                if classification == Classification::Discovered {
                    let found = discovered_count.fetch_add(1, Ordering::Relaxed) + 1;
                    pb.set_message(format!("{} discovered", found));
                }
                pb.inc(1);
            }
        },
    );

    let dispatcher = Dispatcher::new(config.concurrency)
        .with_cancellation(cancel.clone())
        .with_outcome_callback(outcome_callback);

    let started_at = Utc::now();
    let start = Instant::now();
    let summary = dispatcher
        .run(&config.base_url, candidates, requester, aggregator.clone())
        .await?;
    let elapsed = start.elapsed();

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    if summary.cancelled > 0 {
        warn!(
            "Scan interrupted: {} of {} candidates were not probed",
            summary.cancelled, summary.scheduled
        );
    }
    debug!("Dispatch summary: {:?}", summary);

    let state = aggregator.snapshot().await;
    let report = summarize(&state, elapsed)
        .with_started_at(started_at)
        .with_interrupted(cancel.is_cancelled());
    if !report.is_consistent() {
        warn!(
            "Report totals do not add up: {} requests, {} failed, histogram {:?}",
            report.total_requests, report.failed_requests, report.status_code_counts
        );
    }

    info!(
        "Scan finished in {:.2}s: {} requests, {} discovered, {} unusual, {} failed",
        elapsed.as_secs_f64(),
        report.total_requests,
        report.discovered_endpoints.len(),
        report.unusual_endpoints.len(),
        report.failed_requests
    );

    Ok(report)
}

fn log_outcome(url: &str, outcome: &RequestOutcome, classification: Classification) {
    match (classification, outcome) {
        (Classification::Discovered, _) => info!("[200] {}", url),
        (Classification::Unusual, RequestOutcome::Success(code)) => info!("[{}] {}", code, url),
        (Classification::NotFound, _) => debug!("[404] {}", url),
        (_, RequestOutcome::Error(msg)) => warn!("[ERR] {}: {}", url, msg),
        _ => {}
    }
}
