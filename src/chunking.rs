use anyhow::{bail, Context, Result};
use text_splitter::{ChunkConfig, TextSplitter};

/// Represents a text chunk with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The actual text content of this chunk
    pub text: String,
    /// Identifier of the record this chunk was cut from
    pub document_id: String,
    /// Position of this chunk within its record
    pub chunk_index: usize,
}

/// Chunk size limits, measured in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_characters: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            max_characters: 1000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(max_characters: usize, overlap: usize) -> Result<Self> {
        if max_characters == 0 {
            bail!("chunk size must be greater than zero");
        }
        if overlap >= max_characters {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap,
                max_characters
            );
        }
        Ok(ChunkingConfig {
            max_characters,
            overlap,
        })
    }
}

/// Splits record descriptions into bounded, overlapping chunks
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        let chunk_config = ChunkConfig::new(config.max_characters)
            .with_overlap(config.overlap)
            .context("Invalid chunking configuration")?;

        Ok(Chunker {
            splitter: TextSplitter::new(chunk_config),
        })
    }

    /// Split text into chunks belonging to `document_id`, in source order
    pub fn split_into_chunks(&self, text: &str, document_id: &str) -> Vec<TextChunk> {
        self.splitter
            .chunks(text)
            .enumerate()
            .map(|(chunk_index, chunk)| TextChunk {
                text: chunk.to_string(),
                document_id: document_id.to_string(),
                chunk_index,
            })
            .collect()
    }
}
