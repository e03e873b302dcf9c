//! Transient vs fatal classification of failed requests

use regex::{Regex, RegexBuilder};
use stampede_config::RetryConfig;
use std::collections::BTreeSet;

/// Statuses that signal contention or an overloaded upstream
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 7] = [409, 425, 429, 500, 502, 503, 504];

/// Body fragments of a 400 that actually hides transient storage contention
pub const DEFAULT_BODY_SIGNATURES: &str = "40P01|deadlock|serializ|timeout|insert failed";

/// Verdict for one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Retry,
    Fatal,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Retry => write!(f, "retry"),
            Classification::Fatal => write!(f, "fatal"),
        }
    }
}

/// Pure decision function over `(status, body)` of a failed attempt
#[derive(Debug, Clone)]
pub struct RetryClassifier {
    retryable_statuses: BTreeSet<u16>,
    body_signatures: Regex,
}

impl RetryClassifier {
    /// Build a classifier from explicit statuses and a body pattern.
    ///
    /// The pattern is matched case-insensitively anywhere in the body.
    pub fn new(
        retryable_statuses: impl IntoIterator<Item = u16>,
        body_pattern: &str,
    ) -> Result<Self, regex::Error> {
        let body_signatures = RegexBuilder::new(body_pattern)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            retryable_statuses: retryable_statuses.into_iter().collect(),
            body_signatures,
        })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self, regex::Error> {
        Self::new(
            config.retryable_statuses.iter().copied(),
            &config.retryable_body_pattern,
        )
    }

    /// Classify a failed attempt.
    ///
    /// `None` status means the request never got a response (connect error,
    /// reset, timeout) and is always retried.
    pub fn classify(&self, status: Option<u16>, body: Option<&str>) -> Classification {
        let Some(status) = status else {
            return Classification::Retry;
        };

        if self.retryable_statuses.contains(&status) {
            return Classification::Retry;
        }

        if status == 400 && body.is_some_and(|body| self.body_signatures.is_match(body)) {
            return Classification::Retry;
        }

        Classification::Fatal
    }
}

impl Default for RetryClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_STATUSES, DEFAULT_BODY_SIGNATURES)
            .expect("default body signatures are a valid pattern")
    }
}
