use crate::{Result, InferenceError, TokenizerOutput};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use std::path::Path;

/// ONNX sentence-transformer session producing pooled, unit-length embeddings.
pub struct SentenceModel {
    session: Session,
    dimension: usize,
}

impl SentenceModel {
    pub fn new(model_path: &Path, dimension: usize) -> Result<Self> {
        tracing::info!("Loading sentence encoder from: {:?}", model_path);

        if !model_path.exists() {
            return Err(InferenceError::ModelLoad(
                format!("Model file not found: {:?}", model_path)
            ));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(1) // Single-threaded for deterministic output
            .map_err(|e| InferenceError::ModelLoad(format!("Failed to set thread count: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::ModelLoad(format!("Failed to load model: {}", e)))?;

        tracing::info!("Successfully loaded sentence encoder");
        Ok(Self {
            session,
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed(&mut self, tokens: &TokenizerOutput) -> Result<Vec<f32>> {
        use ort::inputs;

        if tokens.is_empty() {
            return Err(InferenceError::Tokenization("Empty token sequence".to_string()));
        }

        let seq_len = tokens.len();
        let input_ids = Tensor::from_array(to_batch(&tokens.input_ids)?)?;
        let attention_mask = Tensor::from_array(to_batch(&tokens.attention_mask)?)?;
        let token_type_ids = Tensor::from_array(to_batch(&tokens.token_type_ids)?)?;

        let outputs = self.session.run(inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids
        ]).map_err(|e| InferenceError::OnnxInference(format!("Inference failed: {}", e)))?;

        let embedding = if let Some((shape, data)) = outputs.get("sentence_embedding")
            .and_then(|output| output.try_extract_tensor::<f32>().ok())
        {
            // Exports with a pooling head already emit [1, hidden]
            tracing::debug!("Using pooled sentence_embedding output with shape: {:?}", shape);
            data.to_vec()
        } else if let Some((shape, data)) = outputs.get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .and_then(|output| output.try_extract_tensor::<f32>().ok())
        {
            tracing::debug!("Mean pooling hidden states with shape: {:?}", shape);
            let hidden_size = shape.get(2).copied().unwrap_or(0) as usize;
            if hidden_size == 0 {
                return Err(InferenceError::OnnxInference(
                    format!("Unexpected hidden state shape: {:?}", shape)
                ));
            }
            mean_pool(data, seq_len, hidden_size, &tokens.attention_mask)
        } else {
            return Err(InferenceError::OnnxInference(
                "Model exposes neither sentence_embedding nor last_hidden_state".to_string()
            ));
        };

        if embedding.len() != self.dimension {
            return Err(InferenceError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        Ok(l2_normalize(embedding))
    }
}

fn to_batch(values: &[i64]) -> Result<ndarray::Array2<i64>> {
    ndarray::Array2::from_shape_vec((1, values.len()), values.to_vec())
        .map_err(|e| InferenceError::OnnxInference(format!("Failed to create input array: {}", e)))
}

/// Averages token vectors of a `[1, seq_len, hidden]` tensor, counting only attended tokens.
pub fn mean_pool(hidden: &[f32], seq_len: usize, hidden_size: usize, attention_mask: &[i64]) -> Vec<f32> {
    let mut pooled = vec![0.0_f32; hidden_size];
    let mut attended = 0.0_f32;

    for token in 0..seq_len.min(attention_mask.len()) {
        if attention_mask[token] == 0 {
            continue;
        }
        let start = token * hidden_size;
        let Some(row) = hidden.get(start..start + hidden_size) else {
            break;
        };
        for (acc, &value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
        attended += 1.0;
    }

    if attended > 0.0 {
        for value in pooled.iter_mut() {
            *value /= attended;
        }
    }
    pooled
}

/// Scales to unit length so dot product equals cosine similarity.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
    vector
}
