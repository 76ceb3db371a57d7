use crate::{Result, InferenceError, EncoderConfig};
use tokenizers::{Tokenizer, TruncationParams};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TokenizerOutput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl TokenizerOutput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

pub struct EncoderTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl EncoderTokenizer {
    pub fn new(tokenizer_path: &Path, max_length: usize) -> Result<Self> {
        tracing::info!("Loading sentence tokenizer from: {:?}", tokenizer_path);

        let tokenizer_file = tokenizer_path.join("tokenizer.json");
        if !tokenizer_file.exists() {
            return Err(InferenceError::Tokenization(
                format!("Tokenizer file not found: {:?}", tokenizer_file)
            ));
        }

        let mut tokenizer = Tokenizer::from_file(&tokenizer_file)
            .map_err(|e| InferenceError::Tokenization(format!("Failed to load tokenizer: {}", e)))?;

        // Single-sentence encoding: no padding, truncation keeps [CLS] .. [SEP] intact
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| InferenceError::Tokenization(format!("Failed to configure truncation: {}", e)))?;

        tracing::info!("Successfully loaded sentence tokenizer");
        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    pub fn from_config(config: &EncoderConfig, base_path: &Path) -> Result<Self> {
        let tokenizer_path = base_path.join(&config.tokenizer_path);
        Self::new(&tokenizer_path, config.max_length)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn tokenize(&self, text: &str) -> Result<TokenizerOutput> {
        let cleaned_text = normalize_whitespace(text);

        let encoding = self.tokenizer
            .encode(cleaned_text, true)
            .map_err(|e| InferenceError::Tokenization(format!("Encoding failed: {}", e)))?;

        Ok(TokenizerOutput {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding.get_attention_mask().iter().map(|&m| m as i64).collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&id| id as i64).collect(),
        })
    }

    pub fn tokenize_batch(&self, texts: &[&str]) -> Result<Vec<TokenizerOutput>> {
        texts.iter()
            .map(|text| self.tokenize(text))
            .collect()
    }
}

/// Drops control characters and collapses whitespace runs.
pub fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\t' || c == '\r' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
