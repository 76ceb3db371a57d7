use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{info, debug, warn};

use crate::{
    client::QdrantVectorClient,
    config::{IndexBackend, IndexConfig},
    embeddings::{EmbeddingService, TextEmbedder},
    error::{Result, VectorDBError},
    index::VectorIndex,
    memory::InMemoryIndex,
    query::SearchQuery,
    schema::{LabeledSnippet, Neighbor, RebuildReport, TrainingSnippet},
    text::TextSanitizer,
};

/// Owns the embedding model and the vector index for the lifetime of the process.
///
/// Rebuild takes the maintenance lock exclusively; searches share it. A search therefore
/// never observes a half-replaced index.
pub struct VectorStorage {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn TextEmbedder>,
    sanitizer: TextSanitizer,
    maintenance: RwLock<()>,
    closed: AtomicBool,
    config: IndexConfig,
}

impl VectorStorage {
    pub async fn open(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        info!("Opening vector storage (backend: {})", config.backend.as_str());

        let encoder_path = config.encoder_config_path.as_deref().map(Path::new);
        let embedder: Arc<dyn TextEmbedder> = Arc::new(EmbeddingService::open(encoder_path));

        let index: Arc<dyn VectorIndex> = match config.backend {
            IndexBackend::Qdrant => Arc::new(QdrantVectorClient::new(config.clone()).await?),
            IndexBackend::Memory => Arc::new(InMemoryIndex::new(config.vector_size)),
        };

        Self::with_components(config, index, embedder)
    }

    pub fn with_components(
        config: IndexConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self> {
        if embedder.dimension() != config.vector_size {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: config.vector_size,
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            index,
            embedder,
            sanitizer: TextSanitizer::new()?,
            maintenance: RwLock::new(()),
            closed: AtomicBool::new(false),
            config,
        })
    }

    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing vector storage...");
        self.ensure_open()?;
        if !self.index.health_check().await? {
            return Err(VectorDBError::internal("Vector index health check failed"));
        }
        info!("Vector storage initialized successfully");
        Ok(())
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Vector storage closed");
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Sanitises, then embeds. `None` when the model is unavailable.
    pub fn embed_text(&self, text: &str) -> Option<Vec<f32>> {
        let cleaned = self.sanitizer.clean(text);
        self.embedder.embed(&cleaned)
    }

    /// Full replace of the index contents. Snippets that fail to embed are dropped.
    pub async fn rebuild(&self, snippets: &[TrainingSnippet]) -> Result<RebuildReport> {
        self.ensure_open()?;
        info!("Preparing to rebuild index from {} training snippets...", snippets.len());

        let mut entries = Vec::with_capacity(snippets.len());
        for snippet in snippets {
            let Some(embedding) = self.embed_text(&snippet.text) else {
                debug!("Skipping snippet that failed to embed: {:.40}", snippet.text);
                continue;
            };
            match LabeledSnippet::new(snippet.text.clone(), snippet.impact, embedding) {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("Skipping snippet with unusable embedding: {}", e),
            }
        }

        if entries.is_empty() && !snippets.is_empty() {
            warn!("Failed to generate any embeddings; index will be empty after rebuild");
        }

        let _guard = self.maintenance.write().await;
        let inserted = self.index.replace_all(entries).await?;

        let report = RebuildReport {
            total: snippets.len(),
            inserted,
        };
        info!(
            "Index rebuild complete: {} inserted, {} skipped, {} total",
            report.inserted,
            report.skipped(),
            report.total
        );
        Ok(report)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Neighbor>> {
        self.ensure_open()?;
        query.validate()?;

        let query_embedding = match &query.vector {
            Some(vector) => vector.clone(),
            None => {
                let text = query.text.as_deref().unwrap_or_default();
                self.embed_text(text)
                    .ok_or_else(|| VectorDBError::embedding_generation("Query embedding unavailable"))?
            }
        };

        let _guard = self.maintenance.read().await;
        self.index
            .query(&query_embedding, query.num_candidates, query.limit)
            .await
    }

    pub async fn count(&self) -> Result<usize> {
        self.ensure_open()?;
        let _guard = self.maintenance.read().await;
        self.index.count().await
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(VectorDBError::Closed)
        }
    }
}
