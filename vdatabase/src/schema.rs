use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VectorDBError};

/// Price-impact label attached to a training snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLabel {
    StockUp,
    StockDown,
    Neutral,
}

impl ImpactLabel {
    /// Vote order; earlier labels win ties.
    pub const ALL: [ImpactLabel; 3] = [ImpactLabel::StockUp, ImpactLabel::StockDown, ImpactLabel::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLabel::StockUp => "STOCK_UP",
            ImpactLabel::StockDown => "STOCK_DOWN",
            ImpactLabel::Neutral => "NEUTRAL",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ImpactLabel::StockUp => 0,
            ImpactLabel::StockDown => 1,
            ImpactLabel::Neutral => 2,
        }
    }
}

impl FromStr for ImpactLabel {
    type Err = VectorDBError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STOCK_UP" => Ok(ImpactLabel::StockUp),
            "STOCK_DOWN" => Ok(ImpactLabel::StockDown),
            "NEUTRAL" => Ok(ImpactLabel::Neutral),
            other => Err(VectorDBError::query_parsing(format!("Unknown impact label: {}", other))),
        }
    }
}

impl fmt::Display for ImpactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict; `Error` marks an infrastructure failure, not a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    StockUp,
    StockDown,
    Neutral,
    Error,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::StockUp => "STOCK_UP",
            Impact::StockDown => "STOCK_DOWN",
            Impact::Neutral => "NEUTRAL",
            Impact::Error => "ERROR",
        }
    }
}

impl From<ImpactLabel> for Impact {
    fn from(label: ImpactLabel) -> Self {
        match label {
            ImpactLabel::StockUp => Impact::StockUp,
            ImpactLabel::StockDown => Impact::StockDown,
            ImpactLabel::Neutral => Impact::Neutral,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
    None,
}

impl ConfidenceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Moderate => "Moderate",
            ConfidenceBand::Low => "Low",
            ConfidenceBand::None => "None",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corpus entry before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSnippet {
    pub text: String,
    pub impact: ImpactLabel,
}

impl TrainingSnippet {
    pub fn new(text: impl Into<String>, impact: ImpactLabel) -> Self {
        Self {
            text: text.into(),
            impact,
        }
    }
}

/// One index entry: a training snippet with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSnippet {
    pub id: String,
    pub text: String,
    pub impact: ImpactLabel,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl LabeledSnippet {
    pub const EMBEDDING_DIM: usize = crate::config::EMBEDDING_DIM;

    pub fn new(text: impl Into<String>, impact: ImpactLabel, embedding: Vec<f32>) -> Result<Self> {
        let snippet = Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            impact,
            embedding,
            indexed_at: Utc::now(),
        };
        snippet.validate_embedding()?;
        Ok(snippet)
    }

    pub fn validate_embedding(&self) -> Result<()> {
        if self.embedding.len() != Self::EMBEDDING_DIM {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: Self::EMBEDDING_DIM,
                actual: self.embedding.len(),
            });
        }
        Ok(())
    }
}

/// A query hit: the neighbour's label and its similarity score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub impact: ImpactLabel,
    pub score: f64,
}

impl Neighbor {
    pub fn new(impact: ImpactLabel, score: f64) -> Self {
        Self { impact, score }
    }

    /// Maps a raw cosine in [-1, 1] onto the [0, 1] score scale via `(1 + cos) / 2`.
    pub fn from_cosine(impact: ImpactLabel, cosine: f64) -> Self {
        Self::new(impact, ((1.0 + cosine) / 2.0).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub total: usize,
    pub inserted: usize,
}

impl RebuildReport {
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.inserted)
    }
}
