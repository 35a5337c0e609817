// Process-wide request pacing

use crate::error::{Result, ScanError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces request issuance to at most `rate` per second across every caller.
///
/// Each `acquire` reserves the next free issue slot under a lock and then sleeps until that slot
/// outside the lock, so concurrent callers queue up one interval apart instead of all waking
/// after the same fixed delay. The first caller is admitted immediately.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Option<Duration>,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// A limiter whose `acquire` never waits.
    pub fn unlimited() -> Self {
        Self {
            interval: None,
            next_slot: Mutex::new(None),
        }
    }

    pub fn per_second(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ScanError::ConfigurationInvalid(format!(
                "rate limit must be a positive number of requests per second, got {}",
                rate
            )));
        }

        let interval = Duration::try_from_secs_f64(1.0 / rate).map_err(|_| {
            ScanError::ConfigurationInvalid(format!(
                "rate limit {} requests per second is too small to schedule",
                rate
            ))
        })?;

        Ok(Self {
            interval: Some(interval),
            next_slot: Mutex::new(None),
        })
    }

    pub fn from_option(rate: Option<f64>) -> Result<Self> {
        match rate {
            Some(rate) => Self::per_second(rate),
            None => Ok(Self::unlimited()),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
