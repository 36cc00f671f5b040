//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

/// A selector string the query engine could not parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not supported by this document: {0}")]
    Unsupported(&'static str),

    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
