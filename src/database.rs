use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeleteCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use std::env;

const DEFAULT_COLLECTION: &str = "portfolio";

/// A chunk together with its vector, as written by the loader
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub document_id: String,
    pub vector: Vec<f32>,
    pub info: String,
    /// The chunk text, not the full source description
    pub description: String,
}

/// A search hit returned by the collection
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub document_id: String,
    pub info: String,
    pub description: String,
    pub score: f32,
}

/// The collection operations the loader and the chat endpoint rely on
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop the collection. Returns `false` when there was nothing to drop.
    async fn drop_collection(&self) -> Result<bool>;

    /// Create the collection, declaring the vector dimension
    async fn create_collection(&self, dimension: u64) -> Result<()>;

    /// Insert a single entry
    async fn insert(&self, chunk: StoredChunk) -> Result<()>;

    /// Nearest entries to `vector`, at most `limit` of them
    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<RetrievedChunk>>;
}

/// Configuration for Qdrant
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl QdrantConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let url = env::var("QDRANT_URL").context("QDRANT_URL not set")?;
        let api_key = env::var("QDRANT_API_KEY").ok().filter(|key| !key.is_empty());
        let collection =
            env::var("QDRANT_COLLECTION").unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());

        Ok(QdrantConfig {
            url,
            api_key,
            collection,
        })
    }
}

/// Qdrant-backed collection
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Create a new Qdrant client
    pub fn new(config: QdrantConfig) -> Result<Self> {
        let config_builder = Qdrant::from_url(&config.url);
        let config_builder = if let Some(api_key) = config.api_key {
            config_builder.api_key(api_key)
        } else {
            config_builder
        };

        let client = config_builder
            .build()
            .with_context(|| format!("Failed to connect to Qdrant at {}", config.url))?;

        Ok(QdrantStore {
            client,
            collection: config.collection,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn drop_collection(&self) -> Result<bool> {
        let exists = self
            .client
            .collection_exists(self.collection.as_str())
            .await
            .with_context(|| format!("Failed to check collection {}", self.collection))?;

        if !exists {
            return Ok(false);
        }

        self.client
            .delete_collection(DeleteCollectionBuilder::new(self.collection.as_str()))
            .await
            .with_context(|| format!("Failed to delete collection {}", self.collection))?;

        Ok(true)
    }

    async fn create_collection(&self, dimension: u64) -> Result<()> {
        let create_collection = CreateCollectionBuilder::new(self.collection.as_str())
            .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .with_context(|| format!("Failed to create collection {}", self.collection))?;

        Ok(())
    }

    async fn insert(&self, chunk: StoredChunk) -> Result<()> {
        let payload = Payload::try_from(json!({
            "document_id": chunk.document_id,
            "info": chunk.info,
            "description": chunk.description,
        }))
        .context("Failed to build point payload")?;

        let point = PointStruct::new(uuid::Uuid::new_v4().to_string(), chunk.vector, payload);

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(self.collection.as_str(), vec![point]).wait(true),
            )
            .await
            .with_context(|| {
                format!("Failed to upsert point in collection {}", self.collection)
            })?;

        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<RetrievedChunk>> {
        let search_response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection.as_str(), vector, limit)
                    .with_payload(true),
            )
            .await
            .with_context(|| format!("Failed to search collection {}", self.collection))?;

        // Convert search results back to chunks
        let chunks = search_response
            .result
            .into_iter()
            .filter_map(|scored_point| {
                let payload = scored_point.payload;
                let text_field = |key: &str| {
                    payload
                        .get(key)
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                };

                let Some(description) = text_field("description") else {
                    debug!("Skipping search hit without a description payload");
                    return None;
                };

                Some(RetrievedChunk {
                    document_id: text_field("document_id").unwrap_or_default(),
                    info: text_field("info").unwrap_or_default(),
                    description,
                    score: scored_point.score,
                })
            })
            .collect();

        Ok(chunks)
    }
}
