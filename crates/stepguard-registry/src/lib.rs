//! # stepguard-registry
//!
//! Indexing and conflict detection for Gherkin step definitions.
//!
//! This crate provides:
//! - Pattern normalization and bag-of-words similarity
//! - Keyword-based domain classification
//! - The corpus index (normalized pattern -> occurrences)
//! - Conflict detection and the audit report

mod conflicts;
mod domain;
mod index;
mod normalize;
mod report;
mod similarity;

pub use conflicts::{detect_conflicts, recommend};
pub use domain::{classify_domain, DomainClassifier};
pub use index::{build_index, in_scope, reusable_for, CorpusIndex, IndexBuild, PatternBucket, Suggestion};
pub use normalize::{is_parameterized, normalize};
pub use report::{ConflictReport, SeveritySummary};
pub use similarity::similarity;
