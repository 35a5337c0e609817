use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::outcome::{Classification, RequestOutcome};
use crate::requester::{Probe, resolve_candidate};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Invoked once per recorded outcome with the resolved URL.
pub type OutcomeCallback = Arc<dyn Fn(&str, &RequestOutcome, Classification) + Send + Sync>;

/// How many candidates settled versus were abandoned on cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
}

/// Fans candidates out to one task each, with at most `concurrency` probes admitted at a time.
pub struct Dispatcher {
    concurrency: usize,
    cancel: CancellationToken,
    outcome_callback: Option<OutcomeCallback>,
}

impl Dispatcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel: CancellationToken::new(),
            outcome_callback: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_outcome_callback(mut self, callback: OutcomeCallback) -> Self {
        self.outcome_callback = Some(callback);
        self
    }

    /// Probe every candidate and record each outcome. Returns once all tasks have finished.
    ///
    /// After cancellation, candidates not yet admitted are skipped and in-flight probes are
    /// dropped at their next suspension point without recording anything.
    pub async fn run<P: Probe>(
        &self,
        base_url: &Url,
        candidates: Vec<String>,
        probe: Arc<P>,
        aggregator: Arc<Aggregator>,
    ) -> Result<DispatchSummary> {
        let scheduled = candidates.len();
        info!(
            "Dispatching {} candidates against {} with concurrency {}",
            scheduled, base_url, self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let base_url = Arc::new(base_url.clone());
        let mut tasks = Vec::with_capacity(scheduled);

        for candidate in candidates {
            let semaphore = semaphore.clone();
            let base_url = base_url.clone();
            let probe = probe.clone();
            let aggregator = aggregator.clone();
            let cancel = self.cancel.clone();
            let callback = self.outcome_callback.clone();

            tasks.push(tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return false,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return false,
                    },
                };

                let (url, outcome) = match resolve_candidate(&base_url, &candidate) {
                    Ok(url) => {
                        let outcome = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return false,
                            outcome = probe.probe(&url) => outcome,
                        };
                        (url.to_string(), outcome)
                    }
                    Err(e) => (candidate, RequestOutcome::Error(e.to_string())),
                };
                drop(permit);

                let classification = aggregator.record(&url, &outcome).await;
                if let Some(ref callback) = callback {
                    callback(&url, &outcome, classification);
                }
                true
            }));
        }

        let mut summary = DispatchSummary {
            scheduled,
            ..DispatchSummary::default()
        };
        for finished in join_all(tasks).await {
            if finished? {
                summary.completed += 1;
            } else {
                summary.cancelled += 1;
            }
        }

        debug!("Dispatch finished: {:?}", summary);
        Ok(summary)
    }
}
