//! Retry engine shared by both downstream clients.
//!
//! The contract that matters is the attempt count: with `max_attempts = 4`
//! and a provider that fails retryably every time, exactly four calls reach
//! the transport. A non-retryable outcome ends the loop immediately.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ConstantBuilder, ExponentialBuilder};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::DownstreamError;
use crate::outcome::{DownstreamOutcome, Service};

/// Which failure classes the retry loop re-issues.
///
/// `NotFound`, client errors and malformed payloads are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOn {
    pub server_errors: bool,
    pub transport_errors: bool,
}

impl RetryOn {
    pub const ALL: RetryOn = RetryOn {
        server_errors: true,
        transport_errors: true,
    };

    pub const NONE: RetryOn = RetryOn {
        server_errors: false,
        transport_errors: false,
    };

    pub fn matches<T>(&self, outcome: &DownstreamOutcome<T>) -> bool {
        match outcome {
            DownstreamOutcome::ServerError { .. } => self.server_errors,
            DownstreamOutcome::TransportError(_) => self.transport_errors,
            DownstreamOutcome::Success(_)
            | DownstreamOutcome::NotFound
            | DownstreamOutcome::ClientError { .. }
            | DownstreamOutcome::Malformed(_) => false,
        }
    }
}

impl Default for RetryOn {
    fn default() -> Self {
        Self::ALL
    }
}

/// Delays between successive attempts.
type Delays = Box<dyn Iterator<Item = Duration> + Send + Sync>;

/// Wait between two attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential {
        base: Duration,
        multiplier: f32,
        max: Duration,
    },
}

impl Backoff {
    /// The delays before each of at most `retries` retries, without jitter.
    pub fn delays(&self, retries: usize) -> impl Iterator<Item = Duration> + Send + Sync {
        self.schedule(retries, false)
    }

    fn schedule(&self, retries: usize, jitter: bool) -> Delays {
        match self {
            Backoff::Fixed(delay) => {
                let builder = ConstantBuilder::default()
                    .with_delay(*delay)
                    .with_max_times(retries);
                if jitter {
                    Box::new(builder.with_jitter().build())
                } else {
                    Box::new(builder.build())
                }
            }
            Backoff::Exponential {
                base,
                multiplier,
                max,
            } => {
                let builder = ExponentialBuilder::default()
                    .with_min_delay(*base)
                    .with_max_delay(*max)
                    .with_factor(*multiplier)
                    .with_max_times(retries);
                if jitter {
                    Box::new(builder.with_jitter().build())
                } else {
                    Box::new(builder.build())
                }
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            base: Duration::from_millis(100),
            multiplier: 2.0,
            max: Duration::from_secs(2),
        }
    }
}

/// Read-only retry configuration; every `execute` call builds its own schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    jitter: bool,
    retry_on: RetryOn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            jitter: true,
            retry_on: RetryOn::ALL,
        }
    }
}

impl RetryPolicy {
    /// One initial call plus three retries.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

    /// `max_attempts` counts the initial call and is clamped to at least 1.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            ..Self::default()
        }
    }

    /// Randomize each delay upward by up to its own length.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Fresh delay schedule for one call: `max_attempts - 1` retries at most.
    fn delays(&self) -> Delays {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        self.backoff.schedule(retries, self.jitter)
    }

    /// Run `call` until it yields a terminal outcome or the attempts run out.
    ///
    /// `id` only feeds the `NotFound` error and the logs.
    pub async fn execute<T, F, Fut>(
        &self,
        service: Service,
        id: &str,
        mut call: F,
    ) -> Result<T, DownstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DownstreamOutcome<T>>,
    {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            let outcome = call().await;

            if !self.retry_on.matches(&outcome) {
                if attempt > 1 {
                    debug!(
                        "{} call for {} settled on attempt {} of {}",
                        service, id, attempt, self.max_attempts
                    );
                }
                return outcome.into_result(service, id, attempt);
            }

            let Some(delay) = delays.next() else {
                warn!(
                    "{} call for {} failed on final attempt {}, giving up",
                    service, id, attempt
                );
                return outcome.into_result(service, id, attempt);
            };

            if let Some(failure) = outcome.failure() {
                warn!(
                    "{} call for {} failed on attempt {} ({}), retrying in {:?}",
                    service, id, attempt, failure, delay
                );
            }
            sleep(delay).await;
            attempt += 1;
        }
    }
}
