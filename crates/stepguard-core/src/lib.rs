//! # stepguard-core
//!
//! Core types for the stepguard step registry.
//!
//! stepguard keeps a suite of Gherkin step definitions free of ambiguous
//! patterns: it indexes every registered step, reports patterns registered
//! more than once, and decides how a newly requested step should be phrased
//! so the test runner can always pick exactly one definition.
//!
//! ## Vocabulary
//!
//! - An occurrence is one step definition found in the corpus
//! - A conflict is a normalized pattern with two or more occurrences
//! - A domain is a coarse functional area (billing, payroll, ...) used to
//!   disambiguate colliding patterns

mod config;
mod error;
mod types;

pub use config::{default_domains, DomainRule, RegistryConfig, ScanConfig};
pub use error::{Result, StepGuardError};
pub use types::*;
