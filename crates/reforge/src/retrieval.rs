//! Similarity retrieval over the vector store.
//!
//! Turns a need description into a newline-joined context string from
//! the nearest indexed chunks. No caching; every call queries the store.

use std::sync::Arc;
use tracing::debug;

use crate::vector_store::VectorStore;

pub struct RetrievalService {
    store: Arc<VectorStore>,
    top_k: usize,
}

impl RetrievalService {
    pub fn new(store: Arc<VectorStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Retrieve context for a need description.
    ///
    /// Returns the top-k nearest chunk texts joined with newlines. An
    /// empty store or a degraded query yields an empty string; the
    /// generator then runs without retrieved context.
    pub async fn context_for(&self, need: &str) -> String {
        let chunks = self.store.query(need, self.top_k).await;
        debug!(need, hits = chunks.len(), "retrieved context chunks");
        chunks
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
