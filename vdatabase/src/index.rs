use async_trait::async_trait;

use crate::{
    error::Result,
    schema::{LabeledSnippet, Neighbor},
};

/// Approximate nearest-neighbour store of labeled snippet embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drops every existing entry and inserts `snippets`. Returns the number inserted.
    async fn replace_all(&self, snippets: Vec<LabeledSnippet>) -> Result<usize>;

    /// Up to `limit` neighbours by descending cosine similarity, scanning at most
    /// `num_candidates` entries.
    async fn query(&self, vector: &[f32], num_candidates: usize, limit: usize) -> Result<Vec<Neighbor>>;

    async fn count(&self) -> Result<usize>;

    async fn health_check(&self) -> Result<bool>;
}
