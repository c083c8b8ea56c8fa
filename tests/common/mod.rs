#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use portfolio_rag::database::{RetrievedChunk, StoredChunk, VectorStore};
use portfolio_rag::embeddings::{Embedder, Embedding};
use portfolio_rag::gemini::GeminiError;
use portfolio_rag::generation::Generator;
use portfolio_rag::rag::{ChatConfig, RagEngine};
use portfolio_rag::server::{self, AppState};

pub const TEST_DIMENSION: usize = 16;

/// Deterministic embedder: byte histogram folded into `dimension` buckets
pub struct FakeEmbedder {
    pub dimension: usize,
    /// Texts containing this fail to embed
    pub fail_on: Option<String>,
    /// Texts containing this get a vector one component short
    pub truncate_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        FakeEmbedder {
            dimension,
            fail_on: None,
            truncate_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0; self.dimension];
        for byte in text.bytes() {
            values[byte as usize % self.dimension] += 1.0;
        }
        values
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.lock().unwrap().push(text.to_string());

        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                bail!("embedding service unavailable");
            }
        }

        let mut values = self.vector_for(text);
        if let Some(marker) = &self.truncate_on {
            if text.contains(marker.as_str()) {
                values.pop();
            }
        }

        Ok(Embedding { values })
    }
}

struct Collection {
    dimension: usize,
    entries: Vec<StoredChunk>,
}

/// Vector store kept in memory, ranking by cosine similarity
#[derive(Default)]
pub struct InMemoryStore {
    pub(crate) collection: Mutex<Option<Collection>>,
    /// Inserts whose description contains this fail
    pub fail_inserts_on: Option<String>,
    pub fail_searches: bool,
}

impl InMemoryStore {
    pub fn entries(&self) -> Vec<StoredChunk> {
        self.collection
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.entries.clone())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.collection.lock().unwrap().is_some()
    }

    /// Create the collection and insert entries directly
    pub fn seeded(dimension: usize, entries: Vec<StoredChunk>) -> Self {
        let store = InMemoryStore::default();
        *store.collection.lock().unwrap() = Some(Collection { dimension, entries });
        store
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn drop_collection(&self) -> Result<bool> {
        Ok(self.collection.lock().unwrap().take().is_some())
    }

    async fn create_collection(&self, dimension: u64) -> Result<()> {
        let mut collection = self.collection.lock().unwrap();
        if collection.is_some() {
            bail!("collection already exists");
        }
        *collection = Some(Collection {
            dimension: dimension as usize,
            entries: Vec::new(),
        });
        Ok(())
    }

    async fn insert(&self, chunk: StoredChunk) -> Result<()> {
        if let Some(marker) = &self.fail_inserts_on {
            if chunk.description.contains(marker.as_str()) {
                bail!("write rejected");
            }
        }

        let mut collection = self.collection.lock().unwrap();
        let collection = collection
            .as_mut()
            .ok_or_else(|| anyhow!("collection not found"))?;
        if chunk.vector.len() != collection.dimension {
            bail!(
                "vector dimension {} does not match collection dimension {}",
                chunk.vector.len(),
                collection.dimension
            );
        }
        collection.entries.push(chunk);
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<RetrievedChunk>> {
        if self.fail_searches {
            bail!("search timed out");
        }

        let collection = self.collection.lock().unwrap();
        let collection = collection
            .as_ref()
            .ok_or_else(|| anyhow!("collection not found"))?;

        let mut hits: Vec<RetrievedChunk> = collection
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                document_id: entry.document_id.clone(),
                info: entry.info.clone(),
                description: entry.description.clone(),
                score: cosine(&vector, &entry.vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit as usize);
        Ok(hits)
    }
}

pub enum GeneratorBehavior {
    /// Reply with a fixed answer
    Reply(String),
    /// Fail with a Gemini API error of this status
    Status(u16),
    /// Fail with a plain error message
    Message(String),
}

/// Generator that records every prompt it receives
pub struct FakeGenerator {
    pub behavior: GeneratorBehavior,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        FakeGenerator {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            GeneratorBehavior::Reply(answer) => Ok(answer.clone()),
            GeneratorBehavior::Status(status) => Err(GeminiError::Api {
                status: *status,
                message: "upstream refused".to_string(),
            }
            .into()),
            GeneratorBehavior::Message(message) => Err(anyhow!(message.clone())),
        }
    }
}

pub fn engine(
    embedder: Arc<FakeEmbedder>,
    store: Arc<InMemoryStore>,
    generator: Arc<FakeGenerator>,
) -> RagEngine {
    RagEngine::new(embedder, store, generator, ChatConfig::default())
}

/// Serve the router on a loopback port and return its base URL
pub async fn spawn_app(engine: RagEngine) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState { engine });

    tokio::spawn(async move {
        server::serve(listener, state, std::future::pending()).await.unwrap();
    });

    format!("http://{}", addr)
}
