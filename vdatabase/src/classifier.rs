use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    config::ClassifierConfig,
    query::QueryBuilder,
    schema::{ConfidenceBand, Impact, ImpactLabel, Neighbor},
    storage::VectorStorage,
};

/// Outcome of classifying one piece of disclosure text.
///
/// `Unavailable` means no embedding could be produced; `Error` means the index failed.
/// Callers must keep the two apart from a genuine neutral verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    Classified {
        impact: ImpactLabel,
        confidence: ConfidenceBand,
        confidence_level: f64,
    },
    Unavailable,
    Error { detail: String },
}

impl Classification {
    /// Collapses the outcome to the flat `{impact, confidence}` pair.
    pub fn to_result(&self) -> ClassificationResult {
        match self {
            Classification::Classified { impact, confidence, .. } => ClassificationResult {
                impact: (*impact).into(),
                confidence: *confidence,
            },
            Classification::Unavailable => ClassificationResult {
                impact: Impact::Neutral,
                confidence: ConfidenceBand::Low,
            },
            Classification::Error { .. } => ClassificationResult {
                impact: Impact::Error,
                confidence: ConfidenceBand::None,
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Classification::Error { .. })
    }

    fn neutral_low() -> Self {
        Classification::Classified {
            impact: ImpactLabel::Neutral,
            confidence: ConfidenceBand::Low,
            confidence_level: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub impact: Impact,
    pub confidence: ConfidenceBand,
}

/// Similarity-weighted votes per label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteTally {
    pub votes: [f64; 3],
    pub total: f64,
    pub winner: ImpactLabel,
    pub confidence_level: f64,
}

/// Sums neighbour scores per label. `None` for an empty neighbour set.
pub fn tally_votes(neighbors: &[Neighbor]) -> Option<VoteTally> {
    if neighbors.is_empty() {
        return None;
    }

    let mut votes = [0.0_f64; 3];
    let mut total = 0.0;
    for neighbor in neighbors {
        votes[neighbor.impact.index()] += neighbor.score;
        total += neighbor.score;
    }

    // strict > keeps the first maximum in label order
    let mut winner = ImpactLabel::ALL[0];
    for label in ImpactLabel::ALL.iter().skip(1) {
        if votes[label.index()] > votes[winner.index()] {
            winner = *label;
        }
    }

    let confidence_level = if total == 0.0 {
        0.0
    } else {
        votes[winner.index()] / total
    };

    Some(VoteTally {
        votes,
        total,
        winner,
        confidence_level,
    })
}

pub fn confidence_band(confidence_level: f64, config: &ClassifierConfig) -> ConfidenceBand {
    if confidence_level >= config.high_threshold {
        ConfidenceBand::High
    } else if confidence_level >= config.moderate_threshold {
        ConfidenceBand::Moderate
    } else {
        ConfidenceBand::Low
    }
}

/// k-nearest-neighbour sentiment classifier over the labeled index.
pub struct SentimentClassifier {
    storage: Arc<VectorStorage>,
    config: ClassifierConfig,
}

impl SentimentClassifier {
    pub fn new(storage: Arc<VectorStorage>, config: ClassifierConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Never fails: every failure mode resolves to a `Classification` variant.
    pub async fn classify(&self, text: &str) -> Classification {
        if !self.storage.is_open() {
            warn!("Classification requested after vector storage was closed");
            return Classification::Error {
                detail: "vector storage is closed".to_string(),
            };
        }

        let Some(embedding) = self.storage.embed_text(text) else {
            warn!("Embedding unavailable; classifying as unavailable");
            return Classification::Unavailable;
        };

        let query = QueryBuilder::neighbors_of(embedding, &self.config);
        let neighbors = match self.storage.search(&query).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!("Index query failed during classification: {}", e);
                return Classification::Error {
                    detail: e.to_string(),
                };
            }
        };

        let Some(tally) = tally_votes(&neighbors) else {
            warn!("Index returned no neighbours; defaulting to neutral");
            return Classification::neutral_low();
        };

        let confidence = confidence_band(tally.confidence_level, &self.config);
        debug!(
            "Classified as {} ({}, level {:.3}) from {} neighbours",
            tally.winner,
            confidence,
            tally.confidence_level,
            neighbors.len()
        );

        Classification::Classified {
            impact: tally.winner,
            confidence,
            confidence_level: tally.confidence_level,
        }
    }
}
