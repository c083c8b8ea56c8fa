use anyhow::Result;
use async_trait::async_trait;

use crate::gemini::GeminiError;

/// Anything that turns a prompt into generated text
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Check whether a generation failure was caused by rate limiting or quota exhaustion.
///
/// A failure counts as rate limited when the Gemini client reported HTTP 429, or when
/// any message in the error chain mentions `429` or `Too Many Requests`.
pub fn is_rate_limited(error: &anyhow::Error) -> bool {
    let status_429 = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<GeminiError>())
        .any(|gemini_error| gemini_error.status() == Some(429));

    if status_429 {
        return true;
    }

    let rendered = format!("{:#}", error);
    rendered.contains("429") || rendered.contains("Too Many Requests")
}
