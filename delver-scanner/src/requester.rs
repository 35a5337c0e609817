use crate::aggregate::Aggregator;
use crate::error::{Result, ScanError};
use crate::limiter::RateLimiter;
use crate::outcome::RequestOutcome;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Anything that can turn a resolved URL into a terminal outcome.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, url: &Url) -> impl Future<Output = RequestOutcome> + Send;
}

/// Transport settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub ignore_ssl: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            headers: Vec::new(),
            ignore_ssl: false,
        }
    }
}

pub fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ScanError::ConfigurationInvalid(format!("invalid header name '{}': {}", name, e))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            ScanError::ConfigurationInvalid(format!("invalid value for header '{}': {}", name, e))
        })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

pub fn build_client(settings: &ClientSettings) -> Result<Client> {
    let headers = build_header_map(&settings.headers)?;

    // Redirects are reported as-is rather than followed
    let client = Client::builder()
        .user_agent(concat!(
            "Delver/",
            env!("CARGO_PKG_VERSION"),
            " (https://github.com/trapdoorsec/delver)"
        ))
        .default_headers(headers)
        .timeout(settings.timeout)
        .connect_timeout(settings.timeout)
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(settings.ignore_ssl)
        .build()?;

    Ok(client)
}

/// Join a candidate onto the base URL with standard relative-reference resolution.
///
/// A candidate starting with `/` replaces the base path; otherwise it replaces the last segment
/// of the base path, so bases are expected to end with `/`.
pub fn resolve_candidate(base: &Url, candidate: &str) -> Result<Url> {
    base.join(candidate)
        .map_err(|e| ScanError::InvalidUrl(format!("cannot join '{}' onto {}: {}", candidate, base, e)))
}

pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(31))
}

/// GET requester with bounded retries and exponential backoff on transport failure.
pub struct HttpRequester {
    client: Client,
    limiter: Arc<RateLimiter>,
    aggregator: Arc<Aggregator>,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpRequester {
    pub fn new(client: Client, aggregator: Arc<Aggregator>, max_retries: u32) -> Self {
        Self {
            client,
            limiter: Arc::new(RateLimiter::unlimited()),
            aggregator,
            max_retries,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    async fn fetch_status(&self, url: &Url) -> std::result::Result<u16, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}

impl Probe for HttpRequester {
    async fn probe(&self, url: &Url) -> RequestOutcome {
        let mut last_error = String::from("no attempts made");

        for attempt in 0..self.max_retries {
            self.limiter.acquire().await;

            match self.fetch_status(url).await {
                Ok(status_code) => {
                    debug!("{} -> {}", url, status_code);
                    return RequestOutcome::Success(status_code);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt + 1 < self.max_retries {
                        let delay = backoff_delay(self.backoff_base, attempt);
                        self.aggregator.record_retry().await;
                        debug!(
                            "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries,
                            url,
                            last_error,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        debug!("Giving up on {}: {}", url, last_error);
        RequestOutcome::Error(last_error)
    }
}
