use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::embeddings::{Embedder, Embedding};
use crate::generation::Generator;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

/// Configuration for Gemini API
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub embedding_model: String,
    pub chat_model: String,
}

impl GeminiConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .context("GEMINI_API_KEY (or GOOGLE_API_KEY) not set")?;

        Ok(GeminiConfig {
            api_key,
            api_base: env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            embedding_model: env::var("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.into()),
            chat_model: env::var("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.into()),
        })
    }

    /// Configuration with default models against a custom API base
    pub fn with_api_base(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: api_key.into(),
            api_base: api_base.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.api_base.trim_end_matches('/'),
            model,
            method
        )
    }
}

/// Errors reported by the Gemini API itself
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API request failed: {status} {message}")]
    Api { status: u16, message: String },
    #[error("No response generated")]
    EmptyResponse,
}

impl GeminiError {
    /// HTTP status of the failed request, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            GeminiError::Api { status, .. } => Some(*status),
            GeminiError::EmptyResponse => None,
        }
    }
}

/// Client for interacting with Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::new();
        GeminiClient { config, client }
    }

    /// Get the client configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Generate embeddings for a text
    pub async fn get_embedding(&self, text: &str) -> Result<Embedding> {
        #[derive(Serialize)]
        struct EmbeddingContent<'a> {
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            model: String,
            content: EmbeddingContent<'a>,
        }

        let request = EmbeddingRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: EmbeddingContent {
                parts: vec![Part { text }],
            },
        };

        let url = self
            .config
            .model_url(&self.config.embedding_model, "embedContent");
        let response = self.post(&url, &request).await?;

        let response_data: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to decode embedding response")?;

        Ok(Embedding {
            values: response_data.embedding.values,
        })
    }

    /// Generate text using the configured chat model
    pub async fn generate_text(
        &self,
        prompt: &str,
        temperature: f32,
        top_p: f32,
        top_k: i32,
        max_output_tokens: i32,
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content::new_with_role(prompt, "user")],
            generation_config: GenerationConfig {
                temperature,
                top_p,
                top_k,
                max_output_tokens,
            },
        };

        let url = self
            .config
            .model_url(&self.config.chat_model, "generateContent");
        let response = self.post(&url, &request).await?;

        let response_data: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode generation response")?;

        // Concatenate the text parts of the first candidate
        let text = response_data
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or(GeminiError::EmptyResponse)?;

        Ok(text)
    }

    /// Generate a markdown answer for an already assembled prompt
    pub async fn generate_answer(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt, 0.2, 0.8, 40, 1024).await
    }

    async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match status.canonical_reason() {
                Some(reason) => format!("{} {}", reason, error_text),
                None => error_text,
            };
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.get_embedding(text).await
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_answer(prompt).await
    }
}

// Shared request/response structures for the Gemini API

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    embedding: EmbeddingData,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    role: &'static str,
}

impl<'a> Content<'a> {
    fn new_with_role(text: &'a str, role: &'static str) -> Self {
        Content {
            parts: vec![Part { text }],
            role,
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}
