use serde::{Deserialize, Serialize};

/// Terminal result of probing one candidate, after any retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    /// An HTTP response arrived. Any status counts, 4xx and 5xx included.
    Success(u16),
    /// Every attempt failed at the transport layer.
    Error(String),
}

impl RequestOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RequestOutcome::Error(_))
    }
}

/// Bucket an outcome lands in once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Discovered,
    NotFound,
    Unusual,
    Failed,
}

impl Classification {
    pub fn of(outcome: &RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::Success(200) => Classification::Discovered,
            RequestOutcome::Success(404) => Classification::NotFound,
            RequestOutcome::Success(_) => Classification::Unusual,
            RequestOutcome::Error(_) => Classification::Failed,
        }
    }
}
