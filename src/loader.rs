use crate::chunking::{Chunker, ChunkingConfig, TextChunk};
use crate::database::{StoredChunk, VectorStore};
use crate::document::DocumentRecord;
use crate::embeddings::{Embedder, Embedding, EMBEDDING_DIMENSION};
use anyhow::Result;
use log::{error, info, warn};

/// What to do with a chunk whose embedding failed or has the wrong dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InvalidEmbeddingPolicy {
    /// Store the chunk with an all-zero vector
    #[default]
    ZeroFill,
    /// Leave the chunk out of the collection
    Skip,
}

/// Loader settings
#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    pub chunking: ChunkingConfig,
    pub dimension: usize,
    pub on_invalid_embedding: InvalidEmbeddingPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            chunking: ChunkingConfig::default(),
            dimension: EMBEDDING_DIMENSION,
            on_invalid_embedding: InvalidEmbeddingPolicy::default(),
        }
    }
}

/// Counters describing a finished load run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub documents: usize,
    pub chunks: usize,
    pub inserted: usize,
    pub zero_filled: usize,
    pub skipped: usize,
    pub failed_inserts: usize,
}

/// Offline loader that rebuilds the collection from the dataset
pub struct Loader<'a> {
    store: &'a dyn VectorStore,
    embedder: &'a dyn Embedder,
    chunker: Chunker,
    config: LoaderConfig,
}

impl<'a> Loader<'a> {
    pub fn new(
        store: &'a dyn VectorStore,
        embedder: &'a dyn Embedder,
        config: LoaderConfig,
    ) -> Result<Self> {
        let chunker = Chunker::new(config.chunking)?;
        Ok(Loader {
            store,
            embedder,
            chunker,
            config,
        })
    }

    /// Drop the collection if present, then create it empty.
    ///
    /// Failures while dropping are logged and ignored; a failure to create is returned.
    pub async fn recreate_collection(&self) -> Result<()> {
        info!("Dropping old collection (if it exists)...");
        match self.store.drop_collection().await {
            Ok(true) => info!("Old collection dropped"),
            Ok(false) => info!("No existing collection found, continuing..."),
            Err(e) => warn!("Could not drop old collection, continuing: {:#}", e),
        }

        info!(
            "Creating new collection with dimension {}...",
            self.config.dimension
        );
        self.store
            .create_collection(self.config.dimension as u64)
            .await
            .inspect_err(|e| error!("Error creating collection: {:#}", e))?;
        info!("New collection created successfully");

        Ok(())
    }

    /// Embed and insert every chunk of every record, one at a time
    pub async fn load_data(&self, records: &[DocumentRecord]) -> LoadReport {
        let mut report = LoadReport::default();

        for record in records {
            let chunks = self
                .chunker
                .split_into_chunks(&record.description, &record.id);
            report.documents += 1;
            report.chunks += chunks.len();

            for chunk in chunks {
                let Some(vector) = self.embed_chunk(&chunk, &mut report).await else {
                    continue;
                };

                let entry = StoredChunk {
                    document_id: record.id.clone(),
                    vector: vector.values,
                    info: record.info.clone(),
                    description: chunk.text,
                };

                match self.store.insert(entry).await {
                    Ok(()) => report.inserted += 1,
                    Err(e) => {
                        error!(
                            "Insertion failed for ID {}, chunk {}: {:#}",
                            record.id, chunk.chunk_index, e
                        );
                        report.failed_inserts += 1;
                    }
                }
            }

            info!("Data inserted for ID {}", record.id);
        }

        info!(
            "Load finished: {} documents, {} chunks, {} inserted, {} zero-filled, {} skipped, {} failed inserts",
            report.documents,
            report.chunks,
            report.inserted,
            report.zero_filled,
            report.skipped,
            report.failed_inserts
        );

        report
    }

    /// Recreate the collection and load every record into it
    pub async fn run(&self, records: &[DocumentRecord]) -> Result<LoadReport> {
        self.recreate_collection().await?;
        Ok(self.load_data(records).await)
    }

    /// Embedding for a chunk, or the policy's substitute when it is unusable.
    /// `None` means the chunk must not be inserted.
    async fn embed_chunk(&self, chunk: &TextChunk, report: &mut LoadReport) -> Option<Embedding> {
        let dimension = self.config.dimension;

        match self.embedder.embed(&chunk.text).await {
            Ok(embedding) if embedding.has_dimension(dimension) => return Some(embedding),
            Ok(embedding) => error!(
                "Invalid embedding size at ID {}, chunk {}: {} (expected {})",
                chunk.document_id,
                chunk.chunk_index,
                embedding.dimension(),
                dimension
            ),
            Err(e) => error!(
                "Embedding error at ID {}, chunk {}: {:#}",
                chunk.document_id, chunk.chunk_index, e
            ),
        }

        match self.config.on_invalid_embedding {
            InvalidEmbeddingPolicy::ZeroFill => {
                report.zero_filled += 1;
                Some(Embedding::zeros(dimension))
            }
            InvalidEmbeddingPolicy::Skip => {
                warn!(
                    "Skipping ID {}, chunk {}",
                    chunk.document_id, chunk.chunk_index
                );
                report.skipped += 1;
                None
            }
        }
    }
}
