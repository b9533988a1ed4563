//! Conflict-free step resolution
//!
//! Resolution tries, in order:
//! 1. Exact reuse of an occurrence with the same normalized pattern, from the
//!    candidate's domain or `general` (any domain for a `general` candidate)
//! 2. Adaptation of the most similar occurrence from the candidate's domain or
//!    `general` above the threshold
//! 3. Minting a domain-qualified pattern, re-checked against the index
//!
//! A minted pattern that still collides after one disambiguation round comes
//! back flagged `unresolved` so the caller can escalate to a human.

use stepguard_core::{
    CandidateStep, RegistryConfig, ResolvedStep, Result, StepGuardError, StepOccurrence,
    GENERAL_DOMAIN,
};
use stepguard_registry::{in_scope, normalize, reusable_for, similarity, CorpusIndex};
use tracing::{debug, info, warn};

use crate::mint::{disambiguate, qualify};

/// Default minimum similarity for adapting an existing step
pub const DEFAULT_REUSE_THRESHOLD: f64 = 0.8;

/// Resolves candidate steps against a read-only corpus index
pub struct StepResolver<'a> {
    index: &'a CorpusIndex,
    reuse_threshold: f64,
}

impl<'a> StepResolver<'a> {
    /// Create a resolver with an explicit reuse threshold in `[0, 1]`
    pub fn new(index: &'a CorpusIndex, reuse_threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&reuse_threshold) {
            return Err(StepGuardError::InvalidThreshold(reuse_threshold));
        }
        Ok(Self {
            index,
            reuse_threshold,
        })
    }

    pub fn from_config(index: &'a CorpusIndex, config: &RegistryConfig) -> Result<Self> {
        Self::new(index, config.reuse_threshold)
    }

    pub fn reuse_threshold(&self) -> f64 {
        self.reuse_threshold
    }

    /// Decide how `candidate` should be phrased
    pub fn resolve(&self, candidate: &CandidateStep) -> ResolvedStep {
        let keyword = candidate.step_type.keyword();
        let domain = candidate_domain(candidate);

        if let Some(occurrence) = self.exact_match(&candidate.description, &domain) {
            debug!(
                "Reusing {} for {:?}",
                occurrence.source_id, candidate.description
            );
            return ResolvedStep::existing(keyword, occurrence);
        }

        if let Some((occurrence, score)) = self.closest_match(&candidate.description, &domain) {
            if score > 0.0 && score >= self.reuse_threshold {
                debug!(
                    "Adapting {} (score {:.2}) for {:?}",
                    occurrence.source_id, score, candidate.description
                );
                return ResolvedStep::adapted(keyword, occurrence, score);
            }
        }

        let qualified = qualify(&candidate.description, &domain, &candidate.step_type);
        if !self.collides(&qualified) {
            debug!("Minted {:?}", qualified);
            return ResolvedStep::generated(keyword, qualified);
        }

        let disambiguated = disambiguate(&qualified, &domain);
        if !self.collides(&disambiguated) {
            info!("Minted {:?} after disambiguation", disambiguated);
            return ResolvedStep::generated(keyword, disambiguated);
        }

        warn!(
            "Could not mint a collision-free pattern for {:?} in {}",
            candidate.description, domain
        );
        ResolvedStep::generated(keyword, disambiguated).mark_unresolved()
    }

    /// Whether `step` can be introduced without creating an ambiguity
    ///
    /// Its normalized text must be absent from the index, or present only as
    /// the occurrence it was taken from.
    pub fn validate(&self, step: &ResolvedStep) -> bool {
        if step.unresolved {
            return false;
        }

        let bucket = self.index.lookup_raw(&step.text);
        if bucket.is_empty() {
            return true;
        }

        match &step.origin_source_id {
            Some(origin) => bucket.iter().any(|o| &o.source_id == origin),
            None => false,
        }
    }

    fn exact_match(&self, description: &str, domain: &str) -> Option<&'a StepOccurrence> {
        self.index
            .lookup(&normalize(description))
            .into_iter()
            .find(|occurrence| reusable_for(occurrence, domain))
    }

    /// Highest-scoring in-scope occurrence; ties keep the earliest inserted
    fn closest_match(&self, description: &str, domain: &str) -> Option<(&'a StepOccurrence, f64)> {
        let mut best: Option<(&'a StepOccurrence, f64)> = None;

        for occurrence in self.index.iter().filter(|o| in_scope(o, domain)) {
            let score = similarity(description, &occurrence.raw_pattern);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((occurrence, score));
            }
        }

        best
    }

    fn collides(&self, text: &str) -> bool {
        self.index.contains_pattern(&normalize(text))
    }
}

/// Resolve one candidate against `index` with the given reuse threshold
///
/// Thresholds outside `[0, 1]` are clamped.
pub fn resolve(candidate: &CandidateStep, index: &CorpusIndex, reuse_threshold: f64) -> ResolvedStep {
    let threshold = if reuse_threshold.is_nan() {
        DEFAULT_REUSE_THRESHOLD
    } else {
        reuse_threshold.clamp(0.0, 1.0)
    };

    StepResolver {
        index,
        reuse_threshold: threshold,
    }
    .resolve(candidate)
}

fn candidate_domain(candidate: &CandidateStep) -> String {
    let domain = candidate.domain.trim().to_lowercase();
    if domain.is_empty() {
        GENERAL_DOMAIN.to_string()
    } else {
        domain
    }
}
