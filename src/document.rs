use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A labeled source record fed to the loader
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Unique identifier of the record
    pub id: String,
    /// Short label, e.g. a section title
    pub info: String,
    /// Long-form text that gets chunked and embedded
    pub description: String,
}

/// Read the dataset: a JSON array of `{ id, info, description }` records
pub fn load_dataset<P: AsRef<Path>>(file_path: P) -> Result<Vec<DocumentRecord>> {
    let path = file_path.as_ref();
    info!("Reading dataset: {}", path.display());

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let records = parse_dataset(&raw)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    debug!("Dataset contains {} records", records.len());
    Ok(records)
}

/// Parse dataset JSON
pub fn parse_dataset(raw: &str) -> Result<Vec<DocumentRecord>> {
    let records: Vec<DocumentRecord> = serde_json::from_str(raw)?;

    for record in records.iter().filter(|r| r.description.trim().is_empty()) {
        warn!("Record {} has an empty description", record.id);
    }

    Ok(records)
}
