//! Index client traits.

use async_trait::async_trait;

use super::error::IndexError;
use crate::cluster::ClusterConfig;
use crate::manifest::Page;

/// How the index reported a successful upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        }
    }
}

/// Create-or-replace access to a search index.
///
/// Calls resolve only once the index has confirmed or rejected the write.
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Upsert `body` as document `id` of type `doc_type` in `index`.
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<UpsertOutcome, IndexError>;
}

/// Opens index clients for a cluster.
pub trait IndexConnector: Send + Sync {
    /// Acquire a client for every node in `cluster`. The client is released
    /// when dropped.
    fn connect(&self, cluster: &ClusterConfig) -> Result<Box<dyn IndexClient>, IndexError>;
}

/// Serialize a page into the flat JSON document stored in the index.
pub fn document_body(page: &Page) -> Result<serde_json::Value, IndexError> {
    serde_json::to_value(page).map_err(|source| IndexError::Serialization {
        id: page.url.clone(),
        source,
    })
}
