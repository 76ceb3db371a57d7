use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::{Result, VectorDBError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub vector: Option<Vec<f32>>,
    pub num_candidates: usize,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self {
            text: None,
            vector: None,
            num_candidates: ClassifierConfig::DEFAULT_NUM_CANDIDATES,
            limit: ClassifierConfig::DEFAULT_LIMIT,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_num_candidates(mut self, num_candidates: usize) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.is_none() && self.vector.is_none() {
            return Err(VectorDBError::query_parsing("Either vector or text query must be provided"));
        }
        if self.limit == 0 {
            return Err(VectorDBError::query_parsing("Limit must be greater than 0"));
        }
        if self.num_candidates < self.limit {
            return Err(VectorDBError::query_parsing("num_candidates must be at least limit"));
        }
        Ok(())
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new()
    }
}

// Query builder for common patterns
pub struct QueryBuilder;
impl QueryBuilder {
    pub fn neighbors_of(vector: Vec<f32>, config: &ClassifierConfig) -> SearchQuery {
        SearchQuery::new()
            .with_vector(vector)
            .with_num_candidates(config.num_candidates)
            .with_limit(config.limit)
    }

    pub fn neighbors_of_text(text: &str, config: &ClassifierConfig) -> SearchQuery {
        SearchQuery::new()
            .with_text(text)
            .with_num_candidates(config.num_candidates)
            .with_limit(config.limit)
    }
}
