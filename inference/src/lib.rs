pub mod error;
pub mod model;
pub mod tokenizer;
pub mod inference;

pub use error::{InferenceError, Result};
pub use inference::SentenceEncoder;
pub use model::SentenceModel;
pub use tokenizer::{EncoderTokenizer, TokenizerOutput};

/// Output width of all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

// Configuration structure matching encoder_config.json
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EncoderConfig {
    pub model_path: String,
    pub tokenizer_path: String,
    pub max_length: usize,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

fn default_dimension() -> usize {
    EMBEDDING_DIM
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}
