//! Error types for Treegrid core.

use thiserror::Error;

/// Errors that can occur in the Treegrid document layer
#[derive(Error, Debug)]
pub enum TreegridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node {0} is not a table")]
    NotATable(String),

    #[error("Node {0} is not a container")]
    NotAContainer(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Column {0} has no runnable formula")]
    NotAFormulaColumn(String),

    #[error("Column {0} is not a timer column")]
    NotATimerColumn(String),

    #[error("Cannot move {node} into itself or its own descendant {target}")]
    MoveIntoDescendant { node: String, target: String },

    #[error("The root node cannot be moved or deleted")]
    RootImmutable,
}

pub type Result<T> = std::result::Result<T, TreegridError>;
