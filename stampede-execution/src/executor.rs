//! Bounded-concurrency batch executor

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stampede_resilience::{RetryExecutor, Retryable, ShutdownSignal};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{truncate_message, BatchError, ItemError, EXAMPLE_COUNT, EXAMPLE_MESSAGE_LIMIT};

/// What a batch does when items fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Run every item, then report all failures at once
    FailSoft,
    /// Stop dispatching after the first terminal failure
    FailFast,
}

/// Settled state of one item
#[derive(Debug)]
pub enum ItemOutcome<O, E> {
    Succeeded { value: O, attempts: u32 },
    Failed(ItemError<E>),
    /// Never dispatched (fail-fast abort or shutdown)
    NotStarted,
}

impl<O, E> ItemOutcome<O, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, ItemOutcome::NotStarted)
    }
}

/// One outcome per item, in item order
#[derive(Debug)]
pub struct BatchReport<O, E> {
    mode: AggregationMode,
    outcomes: Vec<ItemOutcome<O, E>>,
    first_failure: Option<usize>,
    cancelled: bool,
}

impl<O, E> BatchReport<O, E> {
    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn outcomes(&self) -> &[ItemOutcome<O, E>] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn not_started(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_started()).count()
    }

    /// Index of the item that failed first, in completion order
    pub fn first_failure(&self) -> Option<usize> {
        self.first_failure
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<O, E> BatchReport<O, E>
where
    E: Retryable + Display,
{
    /// Apply the batch's aggregation policy.
    ///
    /// Returns the successful values in item order when nothing failed.
    pub fn into_result(self) -> Result<Vec<O>, BatchError> {
        let total = self.outcomes.len();
        let failed = self.failed();

        if self.mode == AggregationMode::FailFast {
            if let Some(index) = self.first_failure {
                if let ItemOutcome::Failed(err) = &self.outcomes[index] {
                    return Err(BatchError::Aborted {
                        index,
                        attempts: err.attempts(),
                        kind: err.kind().to_string(),
                        message: truncate_message(&err.to_string(), EXAMPLE_MESSAGE_LIMIT),
                    });
                }
            }
        }

        if self.cancelled {
            return Err(BatchError::Cancelled {
                completed: total - self.not_started(),
                failed,
                total,
            });
        }

        if failed > 0 {
            let mut by_kind = BTreeMap::new();
            let mut examples = Vec::new();
            for outcome in &self.outcomes {
                if let ItemOutcome::Failed(err) = outcome {
                    *by_kind.entry(err.kind().to_string()).or_insert(0) += 1;
                    if examples.len() < EXAMPLE_COUNT {
                        examples.push(format!(
                            "{}: {}",
                            err.kind(),
                            truncate_message(&err.to_string(), EXAMPLE_MESSAGE_LIMIT)
                        ));
                    }
                }
            }
            return Err(BatchError::Aggregate {
                failed,
                total,
                by_kind,
                examples,
            });
        }

        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ItemOutcome::Succeeded { value, .. } => Some(value),
                _ => None,
            })
            .collect())
    }
}

/// Runs independent items with at most `concurrency` of them in flight.
///
/// Each item holds its concurrency slot for its whole retry loop, backoff
/// sleeps included.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    concurrency: usize,
    retry: RetryExecutor,
    shutdown: Option<ShutdownSignal>,
}

impl BoundedExecutor {
    /// Create an executor; a concurrency of 0 is treated as 1
    pub fn new(concurrency: usize, retry: RetryExecutor) -> Self {
        Self {
            concurrency: concurrency.max(1),
            retry,
            shutdown: None,
        }
    }

    /// Stop dispatching new items once `signal` fires
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `op` for every item and collect one outcome per item.
    ///
    /// `op` receives the item and the 1-based attempt number. Every item
    /// gets its own jitter RNG seeded from `rng`, so a seeded caller gets
    /// reproducible backoff regardless of scheduling order.
    pub async fn run<T, O, E, F, Fut, R>(
        &self,
        items: Vec<T>,
        mode: AggregationMode,
        rng: &mut R,
        op: F,
    ) -> BatchReport<O, E>
    where
        T: Send + Sync + 'static,
        O: Send + 'static,
        E: Retryable + Display + Send + 'static,
        F: Fn(&T, u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        R: Rng + ?Sized,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let halt = Arc::new(AtomicBool::new(false));
        let settled_order = Arc::new(AtomicUsize::new(0));
        let op = Arc::new(op);
        let mut tasks = JoinSet::new();
        let mut cancelled = false;

        let seeds: Vec<u64> = (0..total).map(|_| rng.gen()).collect();

        for ((index, item), seed) in items.into_iter().enumerate().zip(seeds) {
            let Some(permit) = self.acquire(&semaphore).await else {
                warn!("Shutdown requested, {} of {} item(s) not dispatched", total - index, total);
                cancelled = true;
                break;
            };

            // The failing item raises `halt` before giving its slot back
            if halt.load(Ordering::SeqCst) {
                debug!("Fail-fast abort, {} of {} item(s) not dispatched", total - index, total);
                break;
            }

            let op = Arc::clone(&op);
            let retry = self.retry.clone();
            let halt = Arc::clone(&halt);
            let settled_order = Arc::clone(&settled_order);

            tasks.spawn(async move {
                let mut item_rng = StdRng::seed_from_u64(seed);
                let result = AssertUnwindSafe(
                    retry.execute_with_context(&mut item_rng, |attempt| op(&item, attempt)),
                )
                .catch_unwind()
                .await;

                let outcome = match result {
                    Ok(Ok(attempted)) => ItemOutcome::Succeeded {
                        value: attempted.value,
                        attempts: attempted.attempts,
                    },
                    Ok(Err(err)) => ItemOutcome::Failed(ItemError::Retry(err)),
                    Err(panic) => ItemOutcome::Failed(ItemError::Panicked(panic_message(&panic))),
                };

                if outcome.is_failure() && mode == AggregationMode::FailFast {
                    halt.store(true, Ordering::SeqCst);
                }
                let order = settled_order.fetch_add(1, Ordering::SeqCst);
                drop(permit);

                (index, order, outcome)
            });
        }

        let mut outcomes: Vec<ItemOutcome<O, E>> =
            (0..total).map(|_| ItemOutcome::NotStarted).collect();
        let mut first_failure: Option<(usize, usize)> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, order, outcome)) => {
                    if outcome.is_failure() && first_failure.map_or(true, |(_, o)| order < o) {
                        first_failure = Some((index, order));
                    }
                    outcomes[index] = outcome;
                }
                // Panics are caught inside the task; this is runtime shutdown
                Err(e) => error!("Batch item task did not complete: {}", e),
            }
        }

        let report = BatchReport {
            mode,
            outcomes,
            first_failure: first_failure.map(|(index, _)| index),
            cancelled,
        };

        debug!(
            "Batch settled: {} succeeded, {} failed, {} not started",
            report.succeeded(),
            report.failed(),
            report.not_started()
        );

        report
    }

    async fn acquire(&self, semaphore: &Arc<Semaphore>) -> Option<OwnedSemaphorePermit> {
        match &self.shutdown {
            Some(signal) => {
                if signal.is_triggered() {
                    return None;
                }
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => None,
                    permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
                }
            }
            None => Arc::clone(semaphore).acquire_owned().await.ok(),
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
