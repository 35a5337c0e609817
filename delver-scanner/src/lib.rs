pub mod aggregate;
pub mod dispatcher;
pub mod error;
pub mod limiter;
pub mod outcome;
pub mod requester;

pub use aggregate::{AggregateState, Aggregator};
pub use dispatcher::{DispatchSummary, Dispatcher, OutcomeCallback};
pub use error::ScanError;
pub use limiter::RateLimiter;
pub use outcome::{Classification, RequestOutcome};
pub use requester::{ClientSettings, HttpRequester, Probe, build_client, resolve_candidate};
