// Candidate path loading from a local wordlist or a remote list

use delver_scanner::error::{Result, ScanError};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Where the candidate paths come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    File(PathBuf),
    Remote(Url),
}

impl CandidateSource {
    /// Load the ordered candidate list. Any failure here is fatal to the run.
    pub async fn load(&self, timeout: Duration) -> Result<Vec<String>> {
        let candidates = match self {
            CandidateSource::File(path) => {
                debug!("Reading wordlist {}", path.display());
                let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                    ScanError::SourceUnavailable(format!(
                        "failed to read wordlist {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                parse_candidates(&content)
            }
            CandidateSource::Remote(url) => {
                debug!("Fetching remote wordlist {}", url);
                let body = fetch_remote(url, timeout).await?;
                parse_candidates(&body)
            }
        };

        info!("Loaded {} candidates from {}", candidates.len(), self);
        Ok(candidates)
    }
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateSource::File(path) => write!(f, "{}", path.display()),
            CandidateSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

// The remote list gets its own client so run headers never leak to a third party
async fn fetch_remote(url: &Url, timeout: Duration) -> Result<String> {
    let unavailable =
        |e: reqwest::Error| ScanError::SourceUnavailable(format!("failed to fetch {}: {}", url, e));

    let client = Client::builder().timeout(timeout).build()?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(unavailable)?
        .error_for_status()
        .map_err(unavailable)?;

    response.text().await.map_err(unavailable)
}

/// Split a wordlist body into non-empty trimmed lines, keeping order and duplicates.
pub fn parse_candidates(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
