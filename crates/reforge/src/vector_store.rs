//! File-backed vector similarity store.
//!
//! Indexed chunks live in two files in the data directory, always read
//! and written together:
//!
//! | File | Contents |
//! |------|----------|
//! | `chunks.vec` | u32 little-endian dimension header, then one little-endian f32 vector per chunk |
//! | `chunks.meta.json` | serialized `Vec<IndexChunk>` in the same order |
//!
//! # Consistency
//!
//! The vector file is persisted before the metadata file. A crash between
//! the two writes leaves the pair inconsistent, which is detected on load
//! by comparing the vector count against the metadata length; a mismatch
//! is fatal and requires operator intervention. A dimension mismatch
//! (embedding model changed) instead resets the index with a logged
//! warning, since the old vectors cannot be queried against new ones.
//!
//! # Concurrency
//!
//! Mutations are serialized behind a single `RwLock` writer; queries take
//! the read side and proceed concurrently. Embedding happens outside the
//! lock so slow provider calls never block readers.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;

use reforge_core::models::IndexChunk;
use reforge_core::traits::{embed_query, Embedder};
use reforge_core::vector::{blob_to_vec, euclidean_distance, vec_to_blob};

const VECTORS_FILE: &str = "chunks.vec";
const METADATA_FILE: &str = "chunks.meta.json";

struct StoreState {
    vectors: Vec<Vec<f32>>,
    chunks: Vec<IndexChunk>,
}

pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    dims: usize,
    vectors_path: PathBuf,
    metadata_path: PathBuf,
    state: RwLock<StoreState>,
}

impl VectorStore {
    /// Open (or create) the store in `data_dir`.
    ///
    /// The dimension is fixed at construction from the embedder. An
    /// on-disk index with a different dimension is discarded with a
    /// warning; an index whose vector count disagrees with its metadata
    /// is corrupt and refuses to load.
    pub fn open(data_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("create data dir: {}", data_dir.display()))?;

        let vectors_path = data_dir.join(VECTORS_FILE);
        let metadata_path = data_dir.join(METADATA_FILE);
        let dims = embedder.dims();

        let state = load_state(&vectors_path, &metadata_path, dims)?;

        Ok(Self {
            embedder,
            dims,
            vectors_path,
            metadata_path,
            state: RwLock::new(state),
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.state.read().expect("vector store lock poisoned").chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embed and append chunks, then persist the index.
    ///
    /// Embedding failures propagate; a silently dropped chunk would make
    /// later retrieval quietly incomplete.
    pub async fn add(&self, chunks: &[IndexChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await.context("embed chunks")?;

        if vectors.len() != chunks.len() {
            bail!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }
        for v in &vectors {
            if v.len() != self.dims {
                bail!(
                    "embedder returned {}-dim vector, store is {}-dim",
                    v.len(),
                    self.dims
                );
            }
        }

        let mut state = self.state.write().expect("vector store lock poisoned");
        state.vectors.extend(vectors);
        state.chunks.extend_from_slice(chunks);
        self.persist(&state)?;

        Ok(())
    }

    /// Return the `k` nearest chunks to `text` by Euclidean distance,
    /// ascending.
    ///
    /// An empty store yields an empty result. An embedding failure
    /// degrades to an empty result with a warning rather than failing
    /// the caller; retrieval context is best-effort.
    pub async fn query(&self, text: &str, k: usize) -> Vec<IndexChunk> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_vec = match embed_query(self.embedder.as_ref(), text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, returning empty context");
                return Vec::new();
            }
        };

        let state = self.state.read().expect("vector store lock poisoned");
        let mut scored: Vec<(f32, &IndexChunk)> = state
            .vectors
            .iter()
            .zip(state.chunks.iter())
            .map(|(v, c)| (euclidean_distance(&query_vec, v), c))
            .collect();

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, c)| c.clone()).collect()
    }

    /// Write the vector file, then the metadata file.
    fn persist(&self, state: &StoreState) -> Result<()> {
        let mut bytes = Vec::with_capacity(4 + state.vectors.len() * self.dims * 4);
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        for v in &state.vectors {
            bytes.extend_from_slice(&vec_to_blob(v));
        }
        std::fs::write(&self.vectors_path, bytes)
            .with_context(|| format!("write {}", self.vectors_path.display()))?;

        let meta = serde_json::to_vec(&state.chunks).context("serialize chunk metadata")?;
        std::fs::write(&self.metadata_path, meta)
            .with_context(|| format!("write {}", self.metadata_path.display()))?;

        Ok(())
    }
}

fn load_state(vectors_path: &Path, metadata_path: &Path, dims: usize) -> Result<StoreState> {
    let empty = StoreState {
        vectors: Vec::new(),
        chunks: Vec::new(),
    };

    if !vectors_path.exists() && !metadata_path.exists() {
        return Ok(empty);
    }

    if vectors_path.exists() != metadata_path.exists() {
        bail!(
            "vector index is corrupt: {} exists without its companion",
            if vectors_path.exists() {
                vectors_path.display()
            } else {
                metadata_path.display()
            }
        );
    }

    let bytes = std::fs::read(vectors_path)
        .with_context(|| format!("read {}", vectors_path.display()))?;
    if bytes.len() < 4 {
        bail!("vector index is corrupt: missing dimension header");
    }
    let stored_dims = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;

    if stored_dims != dims {
        warn!(
            stored_dims,
            dims, "vector index dimension mismatch, resetting index (stored vectors discarded)"
        );
        return Ok(empty);
    }

    let body = &bytes[4..];
    if dims == 0 || body.len() % (dims * 4) != 0 {
        bail!("vector index is corrupt: truncated vector data");
    }

    let vectors: Vec<Vec<f32>> = body
        .chunks_exact(dims * 4)
        .map(blob_to_vec)
        .collect();

    let meta = std::fs::read(metadata_path)
        .with_context(|| format!("read {}", metadata_path.display()))?;
    let chunks: Vec<IndexChunk> =
        serde_json::from_slice(&meta).context("deserialize chunk metadata")?;

    if vectors.len() != chunks.len() {
        bail!(
            "vector index is corrupt: {} vectors but {} metadata entries",
            vectors.len(),
            chunks.len()
        );
    }

    Ok(StoreState { vectors, chunks })
}
