//! Configuration management for stepguard
//!
//! Repository-level settings: the reuse threshold, the ordered domain keyword
//! table and the globs the corpus scanner walks.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{Result, StepGuardError};

/// Repository-level stepguard configuration
///
/// Loaded from `.stepguard/config.toml` in the repo root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Minimum similarity for adapting an existing step instead of minting one
    #[serde(default = "default_reuse_threshold")]
    pub reuse_threshold: f64,

    /// Maximum number of reuse suggestions returned
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Domain keyword sets, highest priority first
    #[serde(default = "default_domains")]
    pub domains: Vec<DomainRule>,

    /// Corpus scanner settings
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Keywords that place text into a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl DomainRule {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Where step definitions are looked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Globs relative to the scan root
    #[serde(default = "default_step_globs")]
    pub step_globs: Vec<String>,

    /// Path fragments that exclude a file when present
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

// Default value providers
fn default_reuse_threshold() -> f64 {
    0.8
}

fn default_suggestion_limit() -> usize {
    5
}

/// Built-in domain table in classification priority order
pub fn default_domains() -> Vec<DomainRule> {
    vec![
        DomainRule::new("billing", &["billing", "invoice", "subscription"]),
        DomainRule::new("payroll", &["payroll", "payslip", "pay run", "paycheck"]),
        DomainRule::new("company", &["company", "organization"]),
        DomainRule::new("people", &["people", "employee", "contractor"]),
        DomainRule::new("reports", &["reports", "report"]),
        DomainRule::new("wholesale", &["wholesale", "accountant", "partner"]),
    ]
}

fn default_step_globs() -> Vec<String> {
    vec![
        "**/*.steps.ts".to_string(),
        "**/*.steps.js".to_string(),
        "**/step_definitions/**/*.ts".to_string(),
        "**/step_definitions/**/*.js".to_string(),
    ]
}

fn default_exclude() -> Vec<String> {
    vec!["node_modules".to_string()]
}

impl RegistryConfig {
    /// Load configuration from `.stepguard/config.toml` or use defaults
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(".stepguard/config.toml");

        let config: Self = if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| {
                StepGuardError::Config(format!("Failed to parse config file: {}", e))
            })?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Write default configuration to `.stepguard/config.toml`
    pub fn write_default(repo_root: &Path) -> Result<()> {
        let config_dir = repo_root.join(".stepguard");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            StepGuardError::Config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Check values the resolver and classifier depend on
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.reuse_threshold)?;

        if let Some(rule) = self.domains.iter().find(|d| d.name.trim().is_empty()) {
            return Err(StepGuardError::Config(format!(
                "Domain rule with empty name (keywords: {:?})",
                rule.keywords
            )));
        }

        Ok(())
    }

    /// Replace the reuse threshold, rejecting values outside `[0, 1]`
    pub fn with_reuse_threshold(mut self, threshold: f64) -> Result<Self> {
        check_threshold(threshold)?;
        self.reuse_threshold = threshold;
        Ok(self)
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(StepGuardError::InvalidThreshold(threshold))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reuse_threshold: default_reuse_threshold(),
            suggestion_limit: default_suggestion_limit(),
            domains: default_domains(),
            scan: ScanConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step_globs: default_step_globs(),
            exclude: default_exclude(),
        }
    }
}
