use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollection, DeleteCollection, VectorParams, VectorsConfig, Distance,
    PointStruct, UpsertPoints, SearchPoints, SearchParams, CountPoints, ScoredPoint,
    Value as QdrantValue,
};

use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, error, debug, warn};

use crate::{
    config::IndexConfig,
    error::{Result, VectorDBError},
    index::VectorIndex,
    schema::{ImpactLabel, LabeledSnippet, Neighbor},
};

pub struct QdrantVectorClient {
    client: Qdrant,
    config: IndexConfig,
}

impl QdrantVectorClient {
    pub async fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Qdrant::from_url(&config.url)
            .timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| VectorDBError::QdrantClient(e.into()))?;

        Ok(Self { client, config })
    }

    pub fn collection_name(&self) -> &str {
        &self.config.collection_name
    }

    pub async fn create_collection(&self) -> Result<()> {
        info!("Creating collection: {}", self.config.collection_name);

        let create_collection = CreateCollection {
            collection_name: self.config.collection_name.clone(),
            vectors_config: Some(VectorsConfig {
                config: Some(qdrant_client::qdrant::vectors_config::Config::Params(VectorParams {
                    size: self.config.vector_size as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            }),
            ..Default::default()
        };

        match self.client.create_collection(create_collection).await {
            Ok(_) => {
                info!("Collection '{}' created successfully", self.config.collection_name);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already exists") {
                    info!("Collection '{}' already exists", self.config.collection_name);
                    Ok(())
                } else {
                    error!("Failed to create collection: {}", e);
                    Err(VectorDBError::QdrantClient(e.into()))
                }
            }
        }
    }

    pub async fn collection_exists(&self) -> Result<bool> {
        match self.client.collection_info(&self.config.collection_name).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("doesn't exist") || error_msg.contains("not found") {
                    Ok(false)
                } else {
                    Err(VectorDBError::QdrantClient(e.into()))
                }
            }
        }
    }

    pub async fn delete_collection(&self) -> Result<()> {
        let delete_collection = DeleteCollection {
            collection_name: self.config.collection_name.clone(),
            ..Default::default()
        };

        self.client
            .delete_collection(delete_collection)
            .await
            .map_err(|e| VectorDBError::QdrantClient(e.into()))?;

        debug!("Deleted collection: {}", self.config.collection_name);
        Ok(())
    }

    async fn upsert_batch(&self, snippets: &[LabeledSnippet]) -> Result<()> {
        let points: Vec<PointStruct> = snippets
            .iter()
            .map(|snippet| PointStruct {
                id: Some(snippet.id.clone().into()),
                vectors: Some(snippet.embedding.clone().into()),
                payload: snippet_to_payload(snippet),
            })
            .collect();

        let upsert_points = UpsertPoints {
            collection_name: self.config.collection_name.clone(),
            points,
            wait: Some(true),
            ..Default::default()
        };

        self.client
            .upsert_points(upsert_points)
            .await
            .map_err(|e| VectorDBError::QdrantClient(e.into()))?;

        debug!("Upserted {} labeled vectors", snippets.len());
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorClient {
    async fn replace_all(&self, snippets: Vec<LabeledSnippet>) -> Result<usize> {
        for snippet in &snippets {
            snippet.validate_embedding()?;
        }

        if self.collection_exists().await? {
            self.delete_collection().await?;
        }
        self.create_collection().await?;

        for batch in snippets.chunks(self.config.batch_size) {
            self.upsert_batch(batch).await?;
        }

        info!("Inserted {} labeled vectors into '{}'", snippets.len(), self.config.collection_name);
        Ok(snippets.len())
    }

    async fn query(&self, vector: &[f32], num_candidates: usize, limit: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.config.vector_size {
            return Err(VectorDBError::InvalidEmbeddingDimension {
                expected: self.config.vector_size,
                actual: vector.len(),
            });
        }

        let search_points = SearchPoints {
            collection_name: self.config.collection_name.clone(),
            vector: vector.to_vec(),
            limit: limit as u64,
            with_payload: Some(true.into()),
            params: Some(SearchParams {
                hnsw_ef: Some(num_candidates as u64),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self.client
            .search_points(search_points)
            .await
            .map_err(|e| VectorDBError::QdrantClient(e.into()))?;

        Ok(response.result.iter().filter_map(scored_point_to_neighbor).collect())
    }

    async fn count(&self) -> Result<usize> {
        let count_points = CountPoints {
            collection_name: self.config.collection_name.clone(),
            exact: Some(true),
            ..Default::default()
        };

        let response = self.client
            .count(count_points)
            .await
            .map_err(|e| VectorDBError::QdrantClient(e.into()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.health_check().await {
            Ok(_) => {
                info!("Qdrant health check passed");
                Ok(true)
            }
            Err(e) => {
                error!("Qdrant health check failed: {}", e);
                Err(VectorDBError::QdrantClient(e.into()))
            }
        }
    }
}

fn snippet_to_payload(snippet: &LabeledSnippet) -> HashMap<String, QdrantValue> {
    let mut payload = HashMap::new();
    payload.insert("text_snippet".to_string(), snippet.text.clone().into());
    payload.insert("impact".to_string(), snippet.impact.as_str().into());
    payload.insert("timestamp".to_string(), snippet.indexed_at.to_rfc3339().into());
    payload
}

fn scored_point_to_neighbor(point: &ScoredPoint) -> Option<Neighbor> {
    // Points stored without a label count as neutral votes
    let impact = match point.payload.get("impact").and_then(|v| v.as_str()) {
        None => ImpactLabel::Neutral,
        Some(label) => match label.parse::<ImpactLabel>() {
            Ok(impact) => impact,
            Err(e) => {
                warn!("Skipping search hit with unreadable label: {}", e);
                return None;
            }
        },
    };
    Some(Neighbor::from_cosine(impact, point.score as f64))
}
