use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::{
    embeddings::EmbeddingService,
    error::{Result, VectorDBError},
    index::VectorIndex,
    schema::{LabeledSnippet, Neighbor},
};

/// Exact cosine index held in process memory.
///
/// Rebuilds assemble a fresh snapshot and swap it in, so readers always see either the
/// old entry set or the new one.
pub struct InMemoryIndex {
    vector_size: usize,
    entries: RwLock<Arc<Vec<LabeledSnippet>>>,
}

impl InMemoryIndex {
    pub fn new(vector_size: usize) -> Self {
        Self {
            vector_size,
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Result<Arc<Vec<LabeledSnippet>>> {
        self.entries
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| VectorDBError::internal("In-memory index lock poisoned"))
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(crate::config::EMBEDDING_DIM)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn replace_all(&self, snippets: Vec<LabeledSnippet>) -> Result<usize> {
        for snippet in &snippets {
            if snippet.embedding.len() != self.vector_size {
                return Err(VectorDBError::InvalidEmbeddingDimension {
                    expected: self.vector_size,
                    actual: snippet.embedding.len(),
                });
            }
        }

        let inserted = snippets.len();
        let fresh = Arc::new(snippets);
        let mut guard = self.entries
            .write()
            .map_err(|_| VectorDBError::internal("In-memory index lock poisoned"))?;
        *guard = fresh;

        debug!("Swapped in-memory index snapshot with {} entries", inserted);
        Ok(inserted)
    }

    async fn query(&self, vector: &[f32], num_candidates: usize, limit: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.vector_size {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: self.vector_size,
                actual: vector.len(),
            });
        }

        let entries = self.snapshot()?;
        let mut scored = entries
            .iter()
            .map(|entry| {
                EmbeddingService::cosine_similarity(vector, &entry.embedding)
                    .map(|cosine| Neighbor::from_cosine(entry.impact, cosine as f64))
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(num_candidates);
        scored.truncate(limit);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.snapshot()?.len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
