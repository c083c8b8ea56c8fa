use crate::context::{build_context, build_prompt, DEFAULT_PERSONA};
use crate::database::VectorStore;
use crate::embeddings::Embedder;
use crate::error::ChatError;
use crate::generation::{is_rate_limited, Generator};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Number of chunks retrieved per question
pub const DEFAULT_TOP_K: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation held by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// A missing or `null` content reads as empty text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Every `POST /api/chat` response, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub output: String,
}

/// Settings for answering questions
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub persona: String,
    pub top_k: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            persona: DEFAULT_PERSONA.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) engine
#[derive(Clone)]
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
    config: ChatConfig,
}

impl RagEngine {
    /// Create a new RAG engine
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        config: ChatConfig,
    ) -> Self {
        RagEngine {
            embedder,
            store,
            generator,
            config,
        }
    }

    /// Answer the latest message of a conversation from the collection's content
    pub async fn answer(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let question = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        debug!("Answering question: {:?}", question);

        // Get embedding for the question
        let question_embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(ChatError::Internal)?;

        // Retrieve relevant chunks
        let chunks = self
            .store
            .search(question_embedding.values, self.config.top_k)
            .await
            .map_err(ChatError::Internal)?;
        info!("Retrieved {} chunks for question", chunks.len());

        let context = build_context(&chunks);
        let prompt = build_prompt(&self.config.persona, &context, question);

        // Generate answer
        self.generator.generate(&prompt).await.map_err(|e| {
            if is_rate_limited(&e) {
                ChatError::QuotaExceeded(e)
            } else {
                ChatError::GenerationFailed(e)
            }
        })
    }
}
