//! Error types for the workflow engine

use thiserror::Error;

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Error types for the workflow engine
///
/// Node-level collaborator failures are not represented here: they are
/// recorded in the failing node's result slot and the turn keeps running.
/// A `WorkflowError` escaping a node is the "uncaught exception" case and
/// fails the whole turn.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Inbound email is missing data the turn cannot start without
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Graph construction or wiring error
    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),

    /// A routing decision produced a node that is not registered
    #[error("Node {0} not found")]
    NodeNotFound(String),

    /// Thread persistence error
    #[error("Thread persistence error: {0}")]
    ThreadPersistence(String),

    /// Roster or registry loading error
    #[error("Registry error: {0}")]
    Registry(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        WorkflowError::ThreadPersistence(err.to_string())
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::ThreadPersistence(format!("serialization error: {}", err))
    }
}
