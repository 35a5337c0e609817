// Run configuration and its validation

use crate::source::CandidateSource;
use delver_scanner::{ClientSettings, RateLimiter};
use delver_scanner::error::{Result, ScanError};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_WORDLIST_URL: &str =
    "https://raw.githubusercontent.com/danielmiessler/SecLists/master/Discovery/Web-Content/common.txt";

/// Everything a scan needs, fixed for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base_url: Url,
    /// Local wordlist; `None` falls back to the remote default list
    pub wordlist: Option<PathBuf>,
    /// Requests per second; `None` is unlimited
    pub rate_limit: Option<f64>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub concurrency: usize,
    pub max_retries: u32,
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub ignore_ssl: bool,
}

impl ScanConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            wordlist: None,
            rate_limit: None,
            headers: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            output: None,
            verbose: false,
            ignore_ssl: false,
        }
    }

    pub fn with_wordlist(mut self, path: PathBuf) -> Self {
        self.wordlist = Some(path);
        self
    }

    pub fn with_rate_limit(mut self, rate: f64) -> Self {
        self.rate_limit = Some(rate);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_ignore_ssl(mut self, ignore_ssl: bool) -> Self {
        self.ignore_ssl = ignore_ssl;
        self
    }

    /// Reject settings that would make the run meaningless, before any network activity.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;

        if self.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1"));
        }
        if self.max_retries == 0 {
            return Err(invalid("max retries must be at least 1 (it counts total attempts)"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero"));
        }
        RateLimiter::from_option(self.rate_limit)?;
        for (name, _) in &self.headers {
            if name.trim().is_empty() {
                return Err(invalid("header names cannot be empty"));
            }
        }

        Ok(())
    }

    pub fn candidate_source(&self) -> Result<CandidateSource> {
        match self.wordlist {
            Some(ref path) => Ok(CandidateSource::File(path.clone())),
            None => {
                let url = Url::parse(DEFAULT_WORDLIST_URL)
                    .map_err(|e| ScanError::InvalidUrl(format!("default wordlist URL: {}", e)))?;
                Ok(CandidateSource::Remote(url))
            }
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: self.timeout,
            headers: self.headers.clone(),
            ignore_ssl: self.ignore_ssl,
        }
    }
}

fn invalid(msg: &str) -> ScanError {
    ScanError::ConfigurationInvalid(msg.to_string())
}

fn validate_base_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(&format!(
            "base URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid(&format!("base URL '{}' has no host", url)));
    }
    Ok(())
}

/// Parse an absolute base URL.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScanError::ConfigurationInvalid(format!("invalid base URL '{}': {}", raw, e)))?;
    validate_base_url(&url)?;
    Ok(url)
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        ScanError::ConfigurationInvalid(format!(
            "header '{}' is not in 'Name: value' form",
            raw
        ))
    })?;

    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(ScanError::ConfigurationInvalid(format!(
            "header '{}' has an invalid name",
            raw
        )));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
