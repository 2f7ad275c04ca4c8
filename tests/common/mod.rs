//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use page_indexer::{ClusterConfig, IndexClient, IndexConnector, IndexError, UpsertOutcome};

/// One upsert as seen by [`MockIndex`].
#[derive(Debug, Clone)]
pub struct Upsert {
    pub index: String,
    pub doc_type: String,
    pub id: String,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct MockInner {
    documents: Mutex<HashMap<String, serde_json::Value>>,
    upserts: Mutex<Vec<Upsert>>,
    failing: Mutex<HashSet<String>>,
    connects: AtomicUsize,
    fail_connect: Mutex<bool>,
}

/// In-memory index with upsert semantics. Clones share state.
#[derive(Clone, Default)]
pub struct MockIndex {
    inner: Arc<MockInner>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn IndexConnector> {
        Arc::new(self.clone())
    }

    /// Reject upserts for `id` until cleared.
    pub fn fail_id(&self, id: &str) {
        self.inner.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.failing.lock().unwrap().clear();
    }

    pub fn set_fail_connect(&self, fail: bool) {
        *self.inner.fail_connect.lock().unwrap() = fail;
    }

    pub fn upserts(&self) -> Vec<Upsert> {
        self.inner.upserts.lock().unwrap().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.inner.upserts.lock().unwrap().len()
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.upserts().into_iter().map(|u| u.id).collect()
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn document(&self, id: &str) -> Option<serde_json::Value> {
        self.inner.documents.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl IndexClient for MockIndex {
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<UpsertOutcome, IndexError> {
        if self.inner.failing.lock().unwrap().contains(id) {
            return Err(IndexError::Rejected {
                id: id.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.inner.upserts.lock().unwrap().push(Upsert {
            index: index.to_string(),
            doc_type: doc_type.to_string(),
            id: id.to_string(),
            body: body.clone(),
        });
        let previous = self
            .inner
            .documents
            .lock()
            .unwrap()
            .insert(id.to_string(), body.clone());

        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }
}

impl IndexConnector for MockIndex {
    fn connect(&self, _cluster: &ClusterConfig) -> Result<Box<dyn IndexClient>, IndexError> {
        if *self.inner.fail_connect.lock().unwrap() {
            return Err(IndexError::NoNodes);
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

pub fn cluster() -> ClusterConfig {
    ClusterConfig {
        generator: Some("test".to_string()),
        index: "site".to_string(),
        nodes: vec!["localhost:9200".to_string()],
    }
}

/// A manifest record with the given url and modified timestamp.
pub fn record(url: &str, modified: &str) -> serde_json::Value {
    serde_json::json!({
        "url": url,
        "modified": modified,
        "title": format!("Title of {url}"),
        "content": "Body text",
        "path": format!("content{url}.md"),
        "categories": "news, rust",
        "tag": "release",
        "type": "post",
    })
}

pub fn write_manifest(path: &Path, records: &[serde_json::Value]) {
    let json = serde_json::to_string_pretty(records).unwrap();
    std::fs::write(path, json).unwrap();
}

/// Write `pages.json` and its cluster config into `dir`.
pub fn site(dir: &Path, records: &[serde_json::Value]) -> PathBuf {
    let manifest = dir.join("pages.json");
    write_manifest(&manifest, records);
    std::fs::write(
        dir.join("esindexer_config.json"),
        serde_json::to_string(&cluster()).unwrap(),
    )
    .unwrap();
    manifest
}
