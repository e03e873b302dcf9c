//! Retry policy and executor

use log::{debug, warn};
use rand::Rng;
use stampede_config::RetryConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::JitterWindow;
use crate::classifier::{Classification, RetryClassifier};

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per item, including the first one
    pub max_attempts: u32,

    /// Delay window drawn before each retry
    pub backoff: JitterWindow,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: JitterWindow::default(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: JitterWindow::none(),
        }
    }

    /// Number of retries allowed after the first attempt
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: JitterWindow::new(
                Duration::from_millis(config.jitter_min_ms),
                Duration::from_millis(config.jitter_max_ms),
            ),
        }
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Decide whether this failure is worth another attempt
    fn classify(&self, classifier: &RetryClassifier) -> Classification;

    /// Short machine-readable label used when counting failures by type
    fn kind(&self) -> &'static str {
        "error"
    }
}

/// Outcome of one attempt inside a retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub classification: Classification,
}

/// Successful value together with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    classifier: Arc<RetryClassifier>,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy, classifier: RetryClassifier) -> Self {
        Self {
            policy,
            classifier: Arc::new(classifier),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &RetryClassifier {
        &self.classifier
    }

    /// Execute a function with retry logic and attempt context.
    ///
    /// `f` receives the 1-based attempt number. Failures classified as
    /// [`Classification::Retry`] are retried after a jittered delay drawn
    /// from `rng` until the attempt budget is spent.
    pub async fn execute_with_context<F, Fut, T, E, R>(
        &self,
        rng: &mut R,
        mut f: F,
    ) -> Result<Attempted<T>, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
        R: Rng + ?Sized,
    {
        let mut attempt = 1;

        loop {
            match f(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let record = AttemptRecord {
                        attempt,
                        classification: error.classify(&self.classifier),
                    };
                    debug!(
                        "Attempt {} of {} failed ({}): {}",
                        record.attempt, self.policy.max_attempts, record.classification, error
                    );

                    if record.classification == Classification::Fatal {
                        return Err(RetryError::Fatal {
                            attempts: attempt,
                            error,
                        });
                    }

                    if attempt >= self.policy.max_attempts {
                        warn!("Operation failed after {} attempts: {}", attempt, error);
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = self.policy.backoff.sample(rng);
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }

                    attempt += 1;
                }
            }
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Retry budget spent on transient failures
    #[error("Gave up after {attempts} attempt(s). Last error: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    /// Failure classified as not worth retrying
    #[error("Fatal error on attempt {attempts}: {error}")]
    Fatal { attempts: u32, error: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Fatal { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Borrow the error of the final attempt
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last_error, .. } => last_error,
            RetryError::Fatal { error, .. } => error,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}
