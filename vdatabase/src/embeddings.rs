use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, warn};

use inference::SentenceEncoder;

use crate::error::{Result, VectorDBError};

/// Anything that can turn text into a fixed-length vector.
///
/// `None` is the degraded-mode signal: no model loaded, or encoding failed.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Option<Vec<f32>>;

    fn dimension(&self) -> usize;
}

pub struct EmbeddingService {
    embedding_dim: usize,
    encoder: Option<Mutex<SentenceEncoder>>,
}

impl EmbeddingService {
    pub fn new(config_path: &Path) -> Result<Self> {
        let encoder = SentenceEncoder::new(config_path)
            .map_err(|e| {
                error!("Failed to initialize sentence encoder at path '{}': {}", config_path.display(), e);
                VectorDBError::embedding_generation(
                    format!("Failed to initialize sentence encoder: {}", e)
                )
            })?;

        Ok(Self {
            embedding_dim: encoder.dimension(),
            encoder: Some(Mutex::new(encoder)),
        })
    }

    /// Loads the encoder if a config path is given; otherwise, or on failure, runs unloaded.
    pub fn open(config_path: Option<&Path>) -> Self {
        match config_path {
            Some(path) => Self::new(path).unwrap_or_else(|e| {
                warn!("Embedding model unavailable, continuing in degraded mode: {}", e);
                Self::unloaded()
            }),
            None => {
                warn!("No encoder config path configured; embeddings are unavailable");
                Self::unloaded()
            }
        }
    }

    pub fn unloaded() -> Self {
        Self {
            embedding_dim: crate::config::EMBEDDING_DIM,
            encoder: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let encoder = self.encoder.as_ref()
            .ok_or_else(|| VectorDBError::embedding_generation("No embedding model loaded"))?;

        debug!("Generating embedding for {} chars of text", text.len());
        let mut encoder = encoder.lock()
            .map_err(|_| VectorDBError::internal("Embedding model lock poisoned"))?;
        let embedding = encoder.encode(text)
            .map_err(|e| VectorDBError::embedding_generation(
                format!("Failed to generate embedding: {}", e)
            ))?;

        if embedding.len() != self.embedding_dim {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: self.embedding_dim,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: a.len(),
                actual: b.len(),
            });
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
        let magnitude_a: f32 = a.iter().map(|&x| x * x).sum::<f32>().sqrt();
        let magnitude_b: f32 = b.iter().map(|&x| x * x).sum::<f32>().sqrt();

        if magnitude_a == 0.0 || magnitude_b == 0.0 {
            return Ok(0.0);
        }

        Ok(dot_product / (magnitude_a * magnitude_b))
    }
}

impl TextEmbedder for EmbeddingService {
    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.generate_embedding(text) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                debug!("Embedding unavailable: {}", e);
                None
            }
        }
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }
}
