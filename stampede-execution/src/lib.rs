//! Bounded-concurrency execution of independent work items
//!
//! [`BoundedExecutor`] runs every item through its own retry loop while
//! keeping at most `K` items in flight. What happens when items fail is
//! decided by the caller through [`AggregationMode`].

pub mod error;
pub mod executor;

pub use error::{BatchError, ItemError};
pub use executor::{AggregationMode, BatchReport, BoundedExecutor, ItemOutcome};
