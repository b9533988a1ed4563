//! Audit report over a built index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stepguard_core::{ConflictRecord, Severity, SkippedOccurrence};

use crate::conflicts::detect_conflicts;
use crate::index::IndexBuild;

/// Conflict counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl SeveritySummary {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
        }
    }
}

/// Full conflict audit of a corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub generated_at: DateTime<Utc>,
    /// Occurrences that made it into the index
    pub total_occurrences: usize,
    pub distinct_patterns: usize,
    /// Malformed records left out of the index
    pub skipped: Vec<SkippedOccurrence>,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: SeveritySummary,
}

impl ConflictReport {
    pub fn from_build(build: &IndexBuild) -> Self {
        let conflicts = detect_conflicts(&build.index);

        let mut summary = SeveritySummary::default();
        for conflict in &conflicts {
            summary.record(conflict.severity);
        }

        Self {
            generated_at: Utc::now(),
            total_occurrences: build.index.len(),
            distinct_patterns: build.index.pattern_count(),
            skipped: build.skipped.clone(),
            conflicts,
            summary,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Highest severity present, if any conflict exists
    pub fn max_severity(&self) -> Option<Severity> {
        self.conflicts.iter().map(|c| c.severity).max()
    }
}
