pub mod client;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod memory;
pub mod query;
pub mod schema;
pub mod storage;
pub mod text;

pub use error::{VectorDBError, Result};
pub use schema::{
    ConfidenceBand, Impact, ImpactLabel, LabeledSnippet, Neighbor, RebuildReport, TrainingSnippet,
};
pub use client::QdrantVectorClient;
pub use classifier::{Classification, ClassificationResult, SentimentClassifier, VoteTally};
pub use corpus::TrainingCorpus;
pub use embeddings::{EmbeddingService, TextEmbedder};
pub use index::VectorIndex;
pub use memory::InMemoryIndex;
pub use storage::VectorStorage;
pub use query::{SearchQuery, QueryBuilder};
pub use config::{ClassifierConfig, IndexBackend, IndexConfig};
pub use text::TextSanitizer;
