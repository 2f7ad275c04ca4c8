//! HTTP index client for Elasticsearch-compatible document APIs.
//!
//! Upserts are `PUT {node}/{index}/{type}/{id}` with the page as the JSON
//! body. Nodes are tried in order; only connection failures and timeouts
//! move on to the next node.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::client::{IndexClient, IndexConnector, UpsertOutcome};
use super::error::IndexError;
use crate::cluster::ClusterConfig;
use crate::config::IndexSettings;

/// Base URL for a node given as `host`, `host:port` or a full URL.
///
/// Bare hosts get `default_port`.
pub fn node_base_url(node: &str, scheme: &str, default_port: u16) -> Result<Url, IndexError> {
    let raw = if node.contains("://") {
        node.to_string()
    } else if has_port(node) {
        format!("{scheme}://{node}/")
    } else {
        format!("{scheme}://{node}:{default_port}/")
    };

    let url = Url::parse(&raw).map_err(|e| IndexError::InvalidNode {
        node: node.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(IndexError::InvalidNode {
            node: node.to_string(),
            reason: "no host".to_string(),
        });
    }
    Ok(url)
}

fn has_port(node: &str) -> bool {
    node.rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}

/// `{base}/{index}/{doc_type}/{id}` with every segment percent-encoded,
/// including slashes inside the id.
fn document_url(base: &Url, index: &str, doc_type: &str, id: &str) -> Result<Url, IndexError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| IndexError::InvalidNode {
            node: base.to_string(),
            reason: "cannot be a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend([index, doc_type, id]);
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(default)]
    result: Option<String>,
    /// Older clusters report a boolean instead of `result`.
    #[serde(default)]
    created: Option<bool>,
}

impl UpsertResponse {
    fn outcome(self, id: &str) -> Result<UpsertOutcome, IndexError> {
        match (self.result.as_deref(), self.created) {
            (Some("created"), _) | (None, Some(true)) => Ok(UpsertOutcome::Created),
            (Some("updated" | "noop"), _) | (None, Some(false)) => Ok(UpsertOutcome::Updated),
            (Some(other), _) => Err(IndexError::Response {
                id: id.to_string(),
                reason: format!("unknown result '{other}'"),
            }),
            (None, None) => Err(IndexError::Response {
                id: id.to_string(),
                reason: "response has no result".to_string(),
            }),
        }
    }
}

/// Index client bound to one cluster's nodes.
#[derive(Debug)]
pub struct HttpIndexClient {
    client: Client,
    nodes: Vec<Url>,
    timeout: Duration,
}

impl HttpIndexClient {
    /// Build a client for `nodes` with a per-request `timeout`.
    pub fn new(nodes: Vec<Url>, timeout: Duration) -> Result<Self, IndexError> {
        if nodes.is_empty() {
            return Err(IndexError::NoNodes);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IndexError::Client)?;
        Ok(Self {
            client,
            nodes,
            timeout,
        })
    }

    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    async fn read_response(
        &self,
        node: &Url,
        id: &str,
        response: reqwest::Response,
    ) -> Result<UpsertOutcome, IndexError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IndexError::Rejected {
                id: id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UpsertResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                IndexError::Timeout {
                    node: node.to_string(),
                    timeout: self.timeout,
                }
            } else {
                IndexError::Response {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        parsed.outcome(id)
    }
}

#[async_trait]
impl IndexClient for HttpIndexClient {
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<UpsertOutcome, IndexError> {
        let mut last_error = None;

        for node in &self.nodes {
            let url = document_url(node, index, doc_type, id)?;
            crate::debug_event!("index", "put", "{url}");

            match self.client.put(url).json(body).send().await {
                Ok(response) => return self.read_response(node, id, response).await,
                Err(e) if e.is_timeout() => {
                    tracing::warn!("[index] {node} timed out, trying next node");
                    last_error = Some(IndexError::Timeout {
                        node: node.to_string(),
                        timeout: self.timeout,
                    });
                }
                Err(e) if e.is_connect() => {
                    tracing::warn!("[index] cannot connect to {node}: {e}");
                    last_error = Some(IndexError::Transport {
                        node: node.to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    return Err(IndexError::Transport {
                        node: node.to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(last_error.unwrap_or(IndexError::NoNodes))
    }
}

/// Connector producing [`HttpIndexClient`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    scheme: String,
    default_port: u16,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(scheme: impl Into<String>, default_port: u16, timeout: Duration) -> Self {
        Self {
            scheme: scheme.into(),
            default_port,
            timeout,
        }
    }

    pub fn from_settings(settings: &IndexSettings) -> Self {
        Self::new(
            settings.scheme.clone(),
            settings.default_port,
            Duration::from_secs(settings.timeout_secs.max(1)),
        )
    }
}

impl IndexConnector for HttpConnector {
    fn connect(&self, cluster: &ClusterConfig) -> Result<Box<dyn IndexClient>, IndexError> {
        let nodes = cluster
            .nodes
            .iter()
            .map(|node| node_base_url(node, &self.scheme, self.default_port))
            .collect::<Result<Vec<_>, _>>()?;

        let client = HttpIndexClient::new(nodes, self.timeout)?;
        crate::debug_event!(
            "index",
            "connected",
            "{} node(s) for index {}",
            client.nodes().len(),
            cluster.index
        );
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_default_port() {
        let url = node_base_url("es1.internal", "http", 9300).unwrap();
        assert_eq!(url.as_str(), "http://es1.internal:9300/");
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let url = node_base_url("127.0.0.1:9200", "http", 9300).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9200/");
    }

    #[test]
    fn test_full_url_is_kept() {
        let url = node_base_url("https://search.example.com/es/", "http", 9300).unwrap();
        assert_eq!(url.as_str(), "https://search.example.com/es/");
    }

    #[test]
    fn test_invalid_node() {
        assert!(matches!(
            node_base_url("bad host", "http", 9300),
            Err(IndexError::InvalidNode { .. })
        ));
    }

    #[test]
    fn test_document_url_encodes_id() {
        let base = node_base_url("localhost:9200", "http", 9300).unwrap();
        let url = document_url(&base, "site", "post", "/blog/a b").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9200/site/post/%2Fblog%2Fa%20b"
        );
    }

    #[test]
    fn test_document_url_under_prefix() {
        let base = node_base_url("https://search.example.com/es/", "http", 9300).unwrap();
        let url = document_url(&base, "site", "post", "/a").unwrap();
        assert_eq!(url.as_str(), "https://search.example.com/es/site/post/%2Fa");
    }

    #[test]
    fn test_response_outcomes() {
        let parse = |json: &str| {
            serde_json::from_str::<UpsertResponse>(json)
                .unwrap()
                .outcome("/a")
        };
        assert_eq!(parse(r#"{"result": "created"}"#).unwrap(), UpsertOutcome::Created);
        assert_eq!(parse(r#"{"result": "updated"}"#).unwrap(), UpsertOutcome::Updated);
        assert_eq!(parse(r#"{"created": true}"#).unwrap(), UpsertOutcome::Created);
        assert_eq!(parse(r#"{"created": false}"#).unwrap(), UpsertOutcome::Updated);
        assert!(parse(r#"{"_id": "x"}"#).is_err());
    }

    #[test]
    fn test_connect_requires_valid_nodes() {
        let connector = HttpConnector::new("http", 9300, Duration::from_secs(5));
        let cluster = ClusterConfig {
            generator: None,
            index: "site".to_string(),
            nodes: vec!["bad host".to_string()],
        };
        assert!(connector.connect(&cluster).is_err());
    }
}
