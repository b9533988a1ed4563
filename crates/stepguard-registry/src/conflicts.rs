//! Conflict detection over a corpus index
//!
//! A conflict is a normalized pattern registered more than once. Each one
//! gets a severity from its occurrence count and a remediation:
//! - Several domains involved -> qualify each occurrence with its domain
//! - One domain -> merge or reword by hand (prefixing cannot help)

use stepguard_core::{ConflictRecord, Recommendation, Severity, StepOccurrence};
use tracing::debug;

use crate::index::{CorpusIndex, PatternBucket};

/// Every conflict in the index, with severity and recommendation
///
/// Order follows [`CorpusIndex::all_conflicts`]. Pure: repeated calls on the
/// same index give identical output.
pub fn detect_conflicts(index: &CorpusIndex) -> Vec<ConflictRecord> {
    let conflicts: Vec<ConflictRecord> = index
        .all_conflicts()
        .into_iter()
        .map(to_record)
        .collect();

    debug!(
        "Detected {} conflicting patterns in {} occurrences",
        conflicts.len(),
        index.len()
    );

    conflicts
}

/// Remediation for occurrences sharing `normalized_pattern`
pub fn recommend(normalized_pattern: &str, occurrences: &[&StepOccurrence]) -> Recommendation {
    let domains = distinct_domains(occurrences);

    if domains.len() > 1 {
        let suggestions = domains
            .iter()
            .map(|domain| format!("{}_{}", domain, normalized_pattern))
            .collect();
        Recommendation::DomainPrefix {
            domains,
            suggestions,
        }
    } else {
        Recommendation::MergeOrReword {
            domain: domains.into_iter().next().unwrap_or_default(),
        }
    }
}

/// Domains in first-seen order
fn distinct_domains(occurrences: &[&StepOccurrence]) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for occurrence in occurrences {
        if !domains.contains(&occurrence.domain) {
            domains.push(occurrence.domain.clone());
        }
    }
    domains
}

fn to_record(bucket: PatternBucket<'_>) -> ConflictRecord {
    let severity = Severity::from_count(bucket.occurrences.len());
    let recommendation = recommend(bucket.normalized_pattern, &bucket.occurrences);

    ConflictRecord {
        normalized_pattern: bucket.normalized_pattern.to_string(),
        occurrences: bucket.occurrences.into_iter().cloned().collect(),
        severity,
        recommendation,
    }
}
