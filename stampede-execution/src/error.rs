//! Error types for batch execution

use stampede_resilience::{RetryError, Retryable};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

/// Longest example message kept in an aggregated failure
pub const EXAMPLE_MESSAGE_LIMIT: usize = 160;

/// Number of example messages kept in an aggregated failure
pub const EXAMPLE_COUNT: usize = 5;

/// Terminal failure of a single item
#[derive(Error, Debug)]
pub enum ItemError<E> {
    /// Retry loop gave up (fatal classification or budget spent)
    #[error("{0}")]
    Retry(RetryError<E>),

    /// The item's task panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl<E> From<RetryError<E>> for ItemError<E> {
    fn from(err: RetryError<E>) -> Self {
        ItemError::Retry(err)
    }
}

impl<E: Retryable> ItemError<E> {
    /// Label used when counting failures by type
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::Retry(RetryError::Exhausted { last_error, .. }) => last_error.kind(),
            ItemError::Retry(RetryError::Fatal { error, .. }) => error.kind(),
            ItemError::Panicked(_) => "panic",
        }
    }
}

impl<E> ItemError<E> {
    /// Attempts made before the item settled; a panic counts as one
    pub fn attempts(&self) -> u32 {
        match self {
            ItemError::Retry(err) => err.attempts(),
            ItemError::Panicked(_) => 1,
        }
    }
}

/// Batch-level failure produced by an aggregation policy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Fail-soft: every item ran, some of them failed
    #[error("{failed} of {total} item(s) ultimately failed. By type: {}\nExamples:\n{}", render_kinds(.by_kind), render_examples(.examples))]
    Aggregate {
        failed: usize,
        total: usize,
        by_kind: BTreeMap<String, usize>,
        examples: Vec<String>,
    },

    /// Fail-fast: the first terminal failure stopped the batch
    #[error("item {index} failed after {attempts} attempt(s) ({kind}): {message}")]
    Aborted {
        index: usize,
        attempts: u32,
        kind: String,
        message: String,
    },

    /// Shutdown stopped dispatch before every item ran
    #[error("batch cancelled after {completed} of {total} item(s) settled ({failed} failed)")]
    Cancelled {
        completed: usize,
        failed: usize,
        total: usize,
    },
}

impl BatchError {
    /// Number of items that ended in failure
    pub fn failed_count(&self) -> usize {
        match self {
            BatchError::Aggregate { failed, .. } | BatchError::Cancelled { failed, .. } => *failed,
            BatchError::Aborted { .. } => 1,
        }
    }
}

/// Cut a message to at most `limit` characters on a char boundary
pub fn truncate_message(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

fn render_kinds(by_kind: &BTreeMap<String, usize>) -> String {
    let parts: Vec<String> = by_kind
        .iter()
        .map(|(kind, count)| format!("{}={}", kind, count))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn render_examples(examples: &[String]) -> String {
    let mut out = String::new();
    for (i, example) in examples.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "  - {}", example);
    }
    out
}
