//! # stepguard-scan
//!
//! Producers of the step corpus.
//!
//! This crate provides:
//! - The `CorpusSource` trait the CLI loads records through
//! - A scanner for Cucumber step definition files
//! - JSON and in-memory corpus sources

mod scanner;
mod source;

pub use scanner::{extract_steps, StepFileScanner};
pub use source::{CorpusSource, JsonCorpusSource, MemoryCorpusSource};
