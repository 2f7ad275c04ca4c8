//! Error types for search index operations.

use std::time::Duration;
use thiserror::Error;

/// Errors from pushing a document. Each one is isolated to the record
/// being pushed.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("No cluster nodes configured")]
    NoNodes,

    #[error("Invalid node address '{node}': {reason}")]
    InvalidNode { node: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to serialize document {id}: {source}")]
    Serialization {
        id: String,
        source: serde_json::Error,
    },

    #[error("Request to {node} timed out after {timeout:?}")]
    Timeout { node: String, timeout: Duration },

    #[error("Cannot reach {node}: {source}")]
    Transport {
        node: String,
        source: reqwest::Error,
    },

    #[error("Cluster rejected document {id} ({status}): {body}")]
    Rejected { id: String, status: u16, body: String },

    #[error("Unexpected response for document {id}: {reason}")]
    Response { id: String, reason: String },
}
