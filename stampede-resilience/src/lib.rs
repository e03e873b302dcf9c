//! Resilience patterns for Stampede
//!
//! This crate decides which failed requests are worth repeating, paces the
//! repeats with a jittered backoff window, and carries the shutdown signal
//! that stops new work from being dispatched.

pub mod backoff;
pub mod classifier;
pub mod retry;
pub mod shutdown;

// Re-export commonly used types
pub use backoff::JitterWindow;
pub use classifier::{
    Classification, RetryClassifier, DEFAULT_BODY_SIGNATURES, DEFAULT_RETRYABLE_STATUSES,
};
pub use retry::{AttemptRecord, Attempted, RetryError, RetryExecutor, RetryPolicy, Retryable};
pub use shutdown::{InterruptOutcome, ShutdownSignal, FORCED_EXIT_CODE};
