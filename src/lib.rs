pub mod chunking;
pub mod context;
pub mod database;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod loader;
pub mod markdown;
pub mod rag;
pub mod server;
