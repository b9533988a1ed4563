//! # stepguard-resolver
//!
//! Conflict-free resolution of newly requested steps.
//!
//! Given a candidate step and the corpus index, the resolver decides whether
//! to reuse an existing definition, adapt a close match, or mint a new
//! domain-qualified pattern that does not collide with the corpus.

mod mint;
mod resolver;

pub use mint::{disambiguate, qualify};
pub use resolver::{resolve, StepResolver, DEFAULT_REUSE_THRESHOLD};
