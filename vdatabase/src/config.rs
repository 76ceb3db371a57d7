use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use crate::error::{Result, VectorDBError};

pub const EMBEDDING_DIM: usize = inference::EMBEDDING_DIM;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Qdrant,
    Memory,
}

impl IndexBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexBackend::Qdrant => "qdrant",
            IndexBackend::Memory => "memory",
        }
    }
}

impl FromStr for IndexBackend {
    type Err = VectorDBError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexBackend::Qdrant),
            "memory" | "in-memory" | "inmemory" => Ok(IndexBackend::Memory),
            other => Err(VectorDBError::invalid_config(format!(
                "Unknown INDEX_BACKEND '{}' (expected qdrant or memory)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    pub url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
    pub vector_size: usize,
    pub timeout_seconds: u64,
    pub batch_size: usize,
    pub encoder_config_path: Option<String>,
}

impl IndexConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_backend(None)
    }

    /// Like `from_env`, with an explicit backend taking precedence over `INDEX_BACKEND`.
    pub fn from_env_with_backend(backend: Option<IndexBackend>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match backend {
            Some(backend) => backend,
            None => env::var("INDEX_BACKEND")
                .unwrap_or_else(|_| "qdrant".to_string())
                .parse()?,
        };

        let url = match backend {
            IndexBackend::Qdrant => env::var("QDRANT_URL")
                .map_err(|_| VectorDBError::invalid_config("QDRANT_URL not set"))?,
            IndexBackend::Memory => env::var("QDRANT_URL").unwrap_or_default(),
        };

        let api_key = env::var("QDRANT_API_KEY").ok();

        let collection_name = env::var("QDRANT_COLLECTION_NAME")
            .unwrap_or_else(|_| "sentiment_vectors".to_string());

        let vector_size = env::var("QDRANT_VECTOR_SIZE")
            .unwrap_or_else(|_| EMBEDDING_DIM.to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid QDRANT_VECTOR_SIZE"))?;

        let timeout_seconds = env::var("QDRANT_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid QDRANT_TIMEOUT_SECONDS"))?;

        let batch_size = env::var("QDRANT_BATCH_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid QDRANT_BATCH_SIZE"))?;

        let encoder_config_path = env::var("ENCODER_CONFIG_PATH").ok();

        Ok(Self {
            backend,
            url,
            api_key,
            collection_name,
            vector_size,
            timeout_seconds,
            batch_size,
            encoder_config_path,
        })
    }

    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            url: url.into(),
            api_key,
            collection_name: collection_name.into(),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: IndexBackend::Memory,
            url: String::new(),
            ..Self::default()
        }
    }

    pub fn with_encoder_config(mut self, path: impl Into<String>) -> Self {
        self.encoder_config_path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == IndexBackend::Qdrant && self.url.is_empty() {
            return Err(VectorDBError::invalid_config("URL cannot be empty"));
        }

        if self.collection_name.is_empty() {
            return Err(VectorDBError::invalid_config("Collection name cannot be empty"));
        }

        if self.vector_size != EMBEDDING_DIM {
            return Err(VectorDBError::invalid_config(format!(
                "Vector size must be {} for sentence embeddings",
                EMBEDDING_DIM
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(VectorDBError::invalid_config("Timeout must be greater than 0"));
        }

        if self.batch_size == 0 {
            return Err(VectorDBError::invalid_config("Batch size must be greater than 0"));
        }

        if let Some(ref path) = self.encoder_config_path {
            if path.is_empty() {
                return Err(VectorDBError::invalid_config("Encoder config path cannot be empty"));
            }
        }

        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection_name: "sentiment_vectors".to_string(),
            vector_size: EMBEDDING_DIM,
            timeout_seconds: 30,
            batch_size: 100,
            encoder_config_path: None,
        }
    }
}

/// Weighted-vote classifier settings.
///
/// `high_threshold` has varied between 0.60 and 0.70 across deployments; 0.70 is the default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    pub high_threshold: f64,
    pub moderate_threshold: f64,
    pub num_candidates: usize,
    pub limit: usize,
}

impl ClassifierConfig {
    pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.70;
    pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.40;
    pub const DEFAULT_NUM_CANDIDATES: usize = 100;
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let high_threshold = env::var("CLASSIFIER_HIGH_THRESHOLD")
            .unwrap_or_else(|_| Self::DEFAULT_HIGH_THRESHOLD.to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid CLASSIFIER_HIGH_THRESHOLD"))?;

        let moderate_threshold = env::var("CLASSIFIER_MODERATE_THRESHOLD")
            .unwrap_or_else(|_| Self::DEFAULT_MODERATE_THRESHOLD.to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid CLASSIFIER_MODERATE_THRESHOLD"))?;

        let num_candidates = env::var("CLASSIFIER_NUM_CANDIDATES")
            .unwrap_or_else(|_| Self::DEFAULT_NUM_CANDIDATES.to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid CLASSIFIER_NUM_CANDIDATES"))?;

        let limit = env::var("CLASSIFIER_LIMIT")
            .unwrap_or_else(|_| Self::DEFAULT_LIMIT.to_string())
            .parse()
            .map_err(|_| VectorDBError::invalid_config("Invalid CLASSIFIER_LIMIT"))?;

        let config = Self {
            high_threshold,
            moderate_threshold,
            num_candidates,
            limit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_high_threshold(mut self, threshold: f64) -> Self {
        self.high_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.moderate_threshold <= 0.0 || self.moderate_threshold.is_nan() {
            return Err(VectorDBError::invalid_config("Moderate threshold must be greater than 0"));
        }

        if self.moderate_threshold > self.high_threshold {
            return Err(VectorDBError::invalid_config(
                "Moderate threshold cannot exceed the high threshold",
            ));
        }

        if self.high_threshold > 1.0 {
            return Err(VectorDBError::invalid_config("High threshold cannot exceed 1.0"));
        }

        if self.limit == 0 {
            return Err(VectorDBError::invalid_config("Neighbor limit must be greater than 0"));
        }

        if self.num_candidates < self.limit {
            return Err(VectorDBError::invalid_config(
                "Candidate count must be at least the neighbor limit",
            ));
        }

        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            high_threshold: Self::DEFAULT_HIGH_THRESHOLD,
            moderate_threshold: Self::DEFAULT_MODERATE_THRESHOLD,
            num_candidates: Self::DEFAULT_NUM_CANDIDATES,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
