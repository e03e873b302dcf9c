//! Multi-tenant workload for Stampede
//!
//! Each tenant runs a [`TenantWorkflow`]: signup, then for every table
//! create it, define its columns, bulk-insert rows and fire searches.
//! [`LoadRunner`] launches one workflow per tenant concurrently and folds
//! the results into a [`RunReport`].

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod report;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ResourceHandle, TenantContext};
pub use error::WorkflowError;
pub use orchestrator::{tenant_rng, LoadRunner};
pub use report::{RunReport, TenantOutcome};
pub use workflow::{Stage, TenantWorkflow};
