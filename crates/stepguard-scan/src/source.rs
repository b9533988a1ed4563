//! Corpus source abstraction

use async_trait::async_trait;
use std::path::PathBuf;
use stepguard_core::{OccurrenceRecord, Result, StepGuardError};
use tracing::{debug, info};

/// Anything that can produce the corpus of step records (allows mocking in tests)
///
/// Implementations return records in a deterministic order; the index keeps
/// that order inside each bucket.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Load every record of the corpus
    async fn load(&self) -> Result<Vec<OccurrenceRecord>>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Corpus exported as a JSON array of occurrence records
#[derive(Debug, Clone)]
pub struct JsonCorpusSource {
    path: PathBuf,
}

impl JsonCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CorpusSource for JsonCorpusSource {
    async fn load(&self) -> Result<Vec<OccurrenceRecord>> {
        debug!("Reading corpus from {:?}", self.path);

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StepGuardError::Corpus(format!("Failed to read {:?}: {}", self.path, e))
        })?;
        let records: Vec<OccurrenceRecord> = serde_json::from_str(&content)?;

        info!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// Fixed in-memory corpus
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpusSource {
    records: Vec<OccurrenceRecord>,
}

impl MemoryCorpusSource {
    pub fn new(records: Vec<OccurrenceRecord>) -> Self {
        Self { records }
    }

    pub fn with_record(mut self, record: OccurrenceRecord) -> Self {
        self.records.push(record);
        self
    }
}

#[async_trait]
impl CorpusSource for MemoryCorpusSource {
    async fn load(&self) -> Result<Vec<OccurrenceRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{} records", self.records.len())
    }
}
