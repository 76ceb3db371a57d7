use crate::{Result, EncoderConfig, InferenceError};
use crate::model::SentenceModel;
use crate::tokenizer::EncoderTokenizer;
use std::path::Path;

/// Text-to-vector encoder. Identical input text always yields the identical vector
/// for a given model file.
pub struct SentenceEncoder {
    model: SentenceModel,
    tokenizer: EncoderTokenizer,
    config: EncoderConfig,
}

impl SentenceEncoder {
    pub fn new(config_path: &Path) -> Result<Self> {
        tracing::info!("Initializing sentence encoder from: {:?}", config_path);

        let config_content = std::fs::read_to_string(config_path)
            .map_err(|e| InferenceError::Config(format!("Failed to read config file: {}", e)))?;
        let config: EncoderConfig = serde_json::from_str(&config_content)
            .map_err(|e| InferenceError::Config(format!("Failed to parse config: {}", e)))?;
        let base_dir = config_path.parent()
            .ok_or_else(|| InferenceError::Config("Invalid config path".to_string()))?;

        Self::from_config(config, base_dir)
    }

    pub fn from_config(config: EncoderConfig, base_dir: &Path) -> Result<Self> {
        if config.max_length == 0 {
            return Err(InferenceError::Config("max_length must be greater than 0".to_string()));
        }
        if config.dimension == 0 {
            return Err(InferenceError::Config("dimension must be greater than 0".to_string()));
        }

        let tokenizer = EncoderTokenizer::from_config(&config, base_dir)?;
        let model_path = base_dir.join(&config.model_path);
        let model = SentenceModel::new(&model_path, config.dimension)?;
        tracing::info!("Successfully initialized {} encoder", config.model_name);

        Ok(Self {
            model,
            tokenizer,
            config,
        })
    }

    pub fn encode(&mut self, text: &str) -> Result<Vec<f32>> {
        let tokens = self.tokenizer.tokenize(text)?;
        self.model.embed(&tokens)
    }

    pub fn encode_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter()
            .map(|text| self.encode(text))
            .collect()
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn get_config(&self) -> &EncoderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn load_encoder() -> Option<SentenceEncoder> {
        let config_path = PathBuf::from("MiniLM/encoder_config.json");
        if !config_path.exists() {
            println!("Skipping encoder test - config file not found");
            return None;
        }
        match SentenceEncoder::new(&config_path) {
            Ok(encoder) => Some(encoder),
            Err(e) => {
                println!("Skipping encoder test - failed to initialize: {}", e);
                None
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let Some(mut encoder) = load_encoder() else { return };

        let text = "The company withdrew its full-year revenue guidance.";
        let first = encoder.encode(text).unwrap();
        let second = encoder.encode(text).unwrap();

        assert_eq!(first.len(), encoder.dimension());
        assert_eq!(first, second);

        let magnitude: f32 = first.iter().map(|&x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-3, "Embedding should be unit length");
    }

    #[test]
    fn test_batch_encoding() {
        let Some(mut encoder) = load_encoder() else { return };

        let texts = vec![
            "Record quarterly profit and a raised dividend",
            "Material weakness identified in internal controls",
            "Annual meeting scheduled for May",
        ];
        let embeddings = encoder.encode_batch(&texts).unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }

    #[test]
    fn test_missing_config_file() {
        let result = SentenceEncoder::new(&PathBuf::from("no/such/encoder_config.json"));
        assert!(matches!(result, Err(InferenceError::Config(_))));
    }
}
