use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, VectorDBError};
use crate::schema::{ImpactLabel, TrainingSnippet};

const BUNDLED_CORPUS: &str = include_str!("../data/sentiment_corpus.json");

/// Labeled disclosure snippets the index is rebuilt from.
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    snippets: Vec<TrainingSnippet>,
}

impl TrainingCorpus {
    /// The corpus shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CORPUS)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let corpus = Self::from_json(&content)?;
        info!("Loaded {} training snippets from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let snippets: Vec<TrainingSnippet> = serde_json::from_str(content)?;
        Self::new(snippets)
    }

    pub fn new(snippets: Vec<TrainingSnippet>) -> Result<Self> {
        if snippets.is_empty() {
            return Err(VectorDBError::invalid_corpus("Corpus contains no snippets"));
        }

        if let Some(pos) = snippets.iter().position(|s| s.text.trim().is_empty()) {
            return Err(VectorDBError::invalid_corpus(format!(
                "Snippet {} has blank text",
                pos
            )));
        }

        Ok(Self { snippets })
    }

    pub fn snippets(&self) -> &[TrainingSnippet] {
        &self.snippets
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn count_by_label(&self, label: ImpactLabel) -> usize {
        self.snippets.iter().filter(|s| s.impact == label).count()
    }
}
