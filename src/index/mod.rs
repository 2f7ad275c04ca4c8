//! Search index access.
//!
//! [`IndexConnector`] opens one [`IndexClient`] per synchronization run; the
//! client is dropped when the run ends, on every path. [`HttpConnector`]
//! talks to an Elasticsearch-compatible document API.

mod client;
mod error;
mod http;

pub use client::{IndexClient, IndexConnector, UpsertOutcome, document_body};
pub use error::IndexError;
pub use http::{HttpConnector, HttpIndexClient, node_base_url};
