//! Corpus index: normalized pattern -> occurrences
//!
//! The index is an explicit value built from a complete list of records.
//! Nothing is cached at module level, so two indexes never share state.

use std::collections::BTreeMap;

use serde::Serialize;
use stepguard_core::{
    OccurrenceRecord, SkipReason, SkippedOccurrence, StepOccurrence, GENERAL_DOMAIN,
};
use tracing::{debug, info, warn};

use crate::normalize::{is_parameterized, normalize};
use crate::similarity::similarity;

/// In-memory index of step occurrences grouped by normalized pattern
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    /// Every occurrence, in insertion order
    entries: Vec<StepOccurrence>,
    /// Normalized pattern -> positions in `entries`, ascending
    buckets: BTreeMap<String, Vec<usize>>,
}

/// Result of building an index from unvalidated records
#[derive(Debug, Clone, Default)]
pub struct IndexBuild {
    pub index: CorpusIndex,
    /// Records rejected as malformed, in input order
    pub skipped: Vec<SkippedOccurrence>,
}

/// One normalized pattern and the occurrences registered under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBucket<'a> {
    pub normalized_pattern: &'a str,
    pub occurrences: Vec<&'a StepOccurrence>,
}

/// A ranked reuse candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion<'a> {
    pub occurrence: &'a StepOccurrence,
    pub score: f64,
}

/// Build an index from a complete list of records
pub fn build_index(records: impl IntoIterator<Item = OccurrenceRecord>) -> IndexBuild {
    CorpusIndex::build(records)
}

/// Whether an occurrence may be adapted or suggested for a request in `domain`
///
/// Only the request's own domain and `general` are in scope, so a `general`
/// request never picks up a domain-specific step by similarity.
pub fn in_scope(occurrence: &StepOccurrence, domain: &str) -> bool {
    occurrence.domain == domain || occurrence.domain == GENERAL_DOMAIN
}

/// Whether an identical-text occurrence may be reused for a request in `domain`
///
/// Same as [`in_scope`], except that a `general` request reuses an identical
/// step from any domain.
pub fn reusable_for(occurrence: &StepOccurrence, domain: &str) -> bool {
    domain == GENERAL_DOMAIN || in_scope(occurrence, domain)
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index, skipping malformed records
    pub fn build(records: impl IntoIterator<Item = OccurrenceRecord>) -> IndexBuild {
        let mut build = IndexBuild::default();

        for record in records {
            if let Err(skipped) = build.index.insert(record) {
                build.skipped.push(skipped);
            }
        }

        if !build.skipped.is_empty() {
            warn!("Skipped {} malformed step records", build.skipped.len());
        }
        info!(
            "Indexed {} step occurrences across {} patterns",
            build.index.len(),
            build.index.pattern_count()
        );

        build
    }

    /// Validate and add one record
    ///
    /// Records with a blank or absent pattern or domain are rejected so they
    /// cannot open an empty-key bucket that merges unrelated steps.
    pub fn insert(&mut self, record: OccurrenceRecord) -> Result<(), SkippedOccurrence> {
        let occurrence = to_occurrence(record)?;
        debug!(
            "Indexing {} ({}) as {:?}",
            occurrence.source_id, occurrence.domain, occurrence.normalized_pattern
        );

        let position = self.entries.len();
        self.buckets
            .entry(occurrence.normalized_pattern.clone())
            .or_default()
            .push(position);
        self.entries.push(occurrence);
        Ok(())
    }

    /// Occurrences registered under an already-normalized pattern
    pub fn lookup(&self, normalized_pattern: &str) -> Vec<&StepOccurrence> {
        self.buckets
            .get(normalized_pattern)
            .map(|positions| positions.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Occurrences matching a raw pattern after normalization
    pub fn lookup_raw(&self, raw_pattern: &str) -> Vec<&StepOccurrence> {
        self.lookup(&normalize(raw_pattern))
    }

    pub fn contains_pattern(&self, normalized_pattern: &str) -> bool {
        self.buckets.contains_key(normalized_pattern)
    }

    /// Number of occurrences
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct normalized patterns
    pub fn pattern_count(&self) -> usize {
        self.buckets.len()
    }

    /// All occurrences in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StepOccurrence> {
        self.entries.iter()
    }

    /// Every bucket, ordered by normalized pattern
    pub fn buckets(&self) -> impl Iterator<Item = PatternBucket<'_>> {
        self.buckets.iter().map(|(pattern, positions)| PatternBucket {
            normalized_pattern: pattern.as_str(),
            occurrences: positions.iter().map(|&i| &self.entries[i]).collect(),
        })
    }

    /// Buckets with more than one occurrence
    ///
    /// Ordered by occurrence count descending, then normalized pattern
    /// ascending, so reports are reproducible.
    pub fn all_conflicts(&self) -> Vec<PatternBucket<'_>> {
        let mut conflicts: Vec<PatternBucket<'_>> = self
            .buckets()
            .filter(|bucket| bucket.occurrences.len() > 1)
            .collect();

        conflicts.sort_by(|a, b| {
            b.occurrences
                .len()
                .cmp(&a.occurrences.len())
                .then_with(|| a.normalized_pattern.cmp(b.normalized_pattern))
        });

        conflicts
    }

    /// Most similar in-scope occurrences for a description
    ///
    /// Only occurrences with a non-zero score are returned, best first; equal
    /// scores keep insertion order.
    pub fn suggest(&self, description: &str, domain: &str, limit: usize) -> Vec<Suggestion<'_>> {
        let domain = domain.trim().to_lowercase();
        let domain = if domain.is_empty() {
            GENERAL_DOMAIN.to_string()
        } else {
            domain
        };

        let mut suggestions: Vec<Suggestion<'_>> = self
            .entries
            .iter()
            .filter(|occurrence| in_scope(occurrence, &domain))
            .map(|occurrence| Suggestion {
                occurrence,
                score: similarity(description, &occurrence.raw_pattern),
            })
            .filter(|suggestion| suggestion.score > 0.0)
            .collect();

        // Stable sort keeps insertion order among equal scores
        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
        suggestions.truncate(limit);
        suggestions
    }
}

fn to_occurrence(record: OccurrenceRecord) -> Result<StepOccurrence, SkippedOccurrence> {
    let skip = |reason| SkippedOccurrence {
        source_id: record.source_id.clone(),
        reason,
    };

    let raw_pattern = match record.raw_pattern.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.to_string(),
        _ => return Err(skip(SkipReason::MissingPattern)),
    };

    let domain = match record.domain.as_deref() {
        Some(domain) if !domain.trim().is_empty() => domain.trim().to_lowercase(),
        _ => return Err(skip(SkipReason::MissingDomain)),
    };

    Ok(StepOccurrence {
        normalized_pattern: normalize(&raw_pattern),
        is_parameterized: is_parameterized(&raw_pattern),
        keyword: record.keyword.unwrap_or_default(),
        domain,
        source_id: record.source_id,
        raw_pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepguard_core::StepKeyword;

    fn record(source: &str, pattern: &str, domain: &str) -> OccurrenceRecord {
        OccurrenceRecord::new(source)
            .with_pattern(pattern)
            .with_domain(domain)
    }

    #[test]
    fn test_groups_by_normalized_pattern() {
        let build = build_index(vec![
            record("a.ts:1", "Alex enters {string} in the field", "billing"),
            record("b.ts:4", "alex  enters {word} in the FIELD", "payroll"),
            record("c.ts:9", "Alex leaves the field", "billing"),
        ]);
        let index = build.index;

        assert_eq!(index.len(), 3);
        assert_eq!(index.pattern_count(), 2);

        let bucket = index.lookup("alex enters {param} in the field");
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].source_id, "a.ts:1");
        assert_eq!(bucket[1].source_id, "b.ts:4");
        assert!(bucket[0].is_parameterized);

        assert_eq!(index.lookup_raw("Alex leaves the field").len(), 1);
    }

    #[test]
    fn test_lookup_missing_is_empty() {
        let index = CorpusIndex::new();
        assert!(index.lookup("nothing here").is_empty());
        assert!(index.lookup("").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_skips_malformed_records() {
        let build = build_index(vec![
            OccurrenceRecord::new("no-pattern.ts:1").with_domain("billing"),
            record("blank.ts:2", "   ", "billing"),
            OccurrenceRecord::new("no-domain.ts:3").with_pattern("Alex logs in"),
            record("blank-domain.ts:4", "Alex logs in", " "),
            record("ok.ts:5", "Alex logs in", "general"),
        ]);

        assert_eq!(build.index.len(), 1);
        assert!(!build.index.contains_pattern(""));
        assert_eq!(build.skipped.len(), 4);
        assert_eq!(build.skipped[0].reason, SkipReason::MissingPattern);
        assert_eq!(build.skipped[1].reason, SkipReason::MissingPattern);
        assert_eq!(build.skipped[2].reason, SkipReason::MissingDomain);
        assert_eq!(build.skipped[3].source_id, "blank-domain.ts:4");
    }

    #[test]
    fn test_keyword_defaults_and_domain_is_normalized() {
        let build = build_index(vec![
            record("a.ts:1", "Alex logs in", " Billing "),
            record("b.ts:1", "Alex logs out", "billing").with_keyword(StepKeyword::When),
        ]);
        let entries: Vec<&StepOccurrence> = build.index.iter().collect();
        assert_eq!(entries[0].keyword, StepKeyword::Given);
        assert_eq!(entries[0].domain, "billing");
        assert_eq!(entries[1].keyword, StepKeyword::When);
    }

    #[test]
    fn test_all_conflicts_ordering() {
        let build = build_index(vec![
            record("1", "b pattern", "billing"),
            record("2", "b pattern", "billing"),
            record("3", "a pattern", "billing"),
            record("4", "a pattern", "payroll"),
            record("5", "c pattern", "billing"),
            record("6", "c pattern", "billing"),
            record("7", "c pattern", "billing"),
            record("8", "unique", "billing"),
        ]);

        let conflicts = build.index.all_conflicts();
        let order: Vec<&str> = conflicts.iter().map(|c| c.normalized_pattern).collect();
        assert_eq!(order, vec!["c pattern", "a pattern", "b pattern"]);
    }

    #[test]
    fn test_incremental_insert_keeps_buckets() {
        let mut index = CorpusIndex::new();
        index.insert(record("1", "Alex logs in", "general")).unwrap();
        index.insert(record("2", "ALEX logs  in", "billing")).unwrap();
        assert!(index.insert(OccurrenceRecord::new("3")).is_err());

        assert_eq!(index.lookup("alex logs in").len(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_suggest_ranks_in_scope_matches() {
        let build = build_index(vec![
            record("1", "Alex opens the billing page", "billing"),
            record("2", "Alex opens the payroll page", "payroll"),
            record("3", "Alex opens the page", "general"),
            record("4", "Bo signs out", "billing"),
        ]);

        let suggestions = build.index.suggest("Alex opens the billing page", "billing", 5);
        let sources: Vec<&str> = suggestions
            .iter()
            .map(|s| s.occurrence.source_id.as_str())
            .collect();
        assert_eq!(sources, vec!["1", "3"]);
        assert_eq!(suggestions[0].score, 1.0);

        let limited = build.index.suggest("Alex opens the page", "billing", 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].occurrence.source_id, "3");
    }

    #[test]
    fn test_general_suggestions_stay_general() {
        let build = build_index(vec![
            record("1", "Alex opens the billing page", "billing"),
            record("2", "Alex opens the page", "general"),
        ]);

        let suggestions = build.index.suggest("Alex opens the billing page", "general", 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].occurrence.source_id, "2");
    }

    #[test]
    fn test_scope_rules() {
        let build = build_index(vec![
            record("1", "Alex pays", "billing"),
            record("2", "Alex pays", "general"),
        ]);
        let entries: Vec<&StepOccurrence> = build.index.iter().collect();

        assert!(in_scope(entries[0], "billing"));
        assert!(!in_scope(entries[0], "payroll"));
        assert!(!in_scope(entries[0], GENERAL_DOMAIN));
        assert!(in_scope(entries[1], "payroll"));

        assert!(reusable_for(entries[0], GENERAL_DOMAIN));
        assert!(!reusable_for(entries[0], "payroll"));
    }
}
