//! Workflow error types

use stampede_execution::BatchError;
use stampede_http::HttpError;
use thiserror::Error;

use crate::workflow::Stage;

/// Why a tenant workflow stopped
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("tenant {tenant} could not open a connection: {source}")]
    Connect { tenant: usize, source: HttpError },

    #[error("signup failed for {email}: {source}")]
    Signup { email: String, source: HttpError },

    #[error("creating table {name} failed: {source}")]
    CreateTable { name: String, source: HttpError },

    #[error("adding column {column} to {table} failed: {source}")]
    AddColumn {
        table: String,
        column: String,
        source: HttpError,
    },

    #[error("row inserts into {table} failed: {source}")]
    BulkInsert { table: String, source: BatchError },

    #[error("searches on {table} failed: {source}")]
    Query { table: String, source: BatchError },

    #[error("shutdown requested before {stage}")]
    Cancelled { stage: Stage },

    #[error("invalid run setup: {0}")]
    Setup(String),
}

impl WorkflowError {
    /// Stage the workflow was in when it stopped
    pub fn stage(&self) -> Option<Stage> {
        match self {
            WorkflowError::Connect { .. } | WorkflowError::Signup { .. } => Some(Stage::Signup),
            WorkflowError::CreateTable { .. } => Some(Stage::CreateTable),
            WorkflowError::AddColumn { .. } => Some(Stage::AddColumn),
            WorkflowError::BulkInsert { .. } => Some(Stage::AddRow),
            WorkflowError::Query { .. } => Some(Stage::Search),
            WorkflowError::Cancelled { stage } => Some(*stage),
            WorkflowError::Setup(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            WorkflowError::Cancelled { .. }
                | WorkflowError::BulkInsert {
                    source: BatchError::Cancelled { .. },
                    ..
                }
                | WorkflowError::Query {
                    source: BatchError::Cancelled { .. },
                    ..
                }
        )
    }
}
