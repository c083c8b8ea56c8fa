use crate::database::RetrievedChunk;

/// Placed in the context block when the search returned nothing
pub const NO_DATA_MARKER: &str = "no data";

/// The answer the model must give when the context does not cover the question
pub const REFUSAL_MESSAGE: &str = "There is no vector data available to answer your question.";

pub const DEFAULT_PERSONA: &str =
    "You are an AI assistant answering questions about this portfolio on behalf of its owner.";

/// Build the context block from search hits, one bullet per hit
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    let body = if chunks.is_empty() {
        NO_DATA_MARKER.to_string()
    } else {
        chunks
            .iter()
            .map(|chunk| format!("- {}: {}", chunk.info, chunk.description))
            .collect::<Vec<String>>()
            .join("\n")
    };

    format!("START CONTEXT\n{}\nEND CONTEXT", body)
}

/// Build the full prompt: persona and grounding rules, then the user's literal question
pub fn build_prompt(persona: &str, context: &str, question: &str) -> String {
    format!(
        "{persona}\n\
         Answer only using the following context:\n\
         {context}\n\
         If the answer is not in the context, respond with:\n\
         \"{REFUSAL_MESSAGE}\"\n\
         Format responses using markdown for readability.\n\
         \n\
         User Question:\n\
         {question}"
    )
}
