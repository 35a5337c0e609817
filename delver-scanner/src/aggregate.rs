// Shared tally of probe outcomes

use crate::outcome::{Classification, RequestOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Counters and buckets accumulated over a run.
///
/// `total_requests` always equals the sum of `status_code_counts` plus `failed_requests`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateState {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    pub status_code_counts: BTreeMap<u16, u64>,
    pub discovered: Vec<String>,
    pub unusual: Vec<(String, u16)>,
}

impl AggregateState {
    pub fn apply(&mut self, url: &str, outcome: &RequestOutcome) -> Classification {
        let classification = Classification::of(outcome);
        self.total_requests += 1;

        match outcome {
            RequestOutcome::Success(code) => {
                *self.status_code_counts.entry(*code).or_insert(0) += 1;
                match classification {
                    Classification::Discovered => self.discovered.push(url.to_string()),
                    Classification::Unusual => self.unusual.push((url.to_string(), *code)),
                    _ => {}
                }
            }
            RequestOutcome::Error(_) => {
                self.failed_requests += 1;
            }
        }

        classification
    }

    pub fn is_conserved(&self) -> bool {
        let responded: u64 = self.status_code_counts.values().sum();
        self.total_requests == responded + self.failed_requests
    }
}

/// Concurrency-safe owner of the run's `AggregateState`.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregateState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the final outcome for one candidate. Call exactly once per candidate.
    pub async fn record(&self, url: &str, outcome: &RequestOutcome) -> Classification {
        let mut state = self.state.lock().await;
        let classification = state.apply(url, outcome);
        debug!("Recorded {} as {:?}", url, classification);
        classification
    }

    pub async fn record_retry(&self) {
        self.state.lock().await.retries += 1;
    }

    pub async fn snapshot(&self) -> AggregateState {
        self.state.lock().await.clone()
    }
}
