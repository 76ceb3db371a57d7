#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use vdatabase::{
    ImpactLabel, InMemoryIndex, IndexConfig, TextEmbedder, TrainingSnippet, VectorStorage,
};

pub const DIM: usize = 384;

/// Deterministic embedder for tests. Texts listed in `vectors` get a fixed vector, texts
/// containing a `fail_on` marker fail to embed, everything else is hashed into a bag of words.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail_on: Vec<String>,
    unavailable: bool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on.push(marker.to_string());
        self
    }
}

impl TextEmbedder for FakeEmbedder {
    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        if self.unavailable || self.fail_on.iter().any(|m| text.contains(m.as_str())) {
            return None;
        }
        if let Some(vector) = self.vectors.get(text) {
            return Some(vector.clone());
        }

        let mut vector = vec![0.0_f32; DIM];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % DIM] += 1.0;
        }
        Some(vector)
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

pub fn axis(hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[hot] = 1.0;
    v
}

pub fn memory_storage(embedder: FakeEmbedder) -> Arc<VectorStorage> {
    let storage = VectorStorage::with_components(
        IndexConfig::in_memory(),
        Arc::new(InMemoryIndex::default()),
        Arc::new(embedder),
    )
    .expect("storage");
    Arc::new(storage)
}

pub fn snippet(text: &str, impact: ImpactLabel) -> TrainingSnippet {
    TrainingSnippet::new(text, impact)
}
