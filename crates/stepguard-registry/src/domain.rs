//! Keyword-based domain classification
//!
//! Classification is a fixed-priority keyword scan, not a learned model.
//! Conflict avoidance only needs every caller to put the same text into the
//! same domain.

use stepguard_core::{default_domains, DomainRule, RegistryConfig, GENERAL_DOMAIN};

/// Assigns a domain tag to free text
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    /// Rules with lower-cased names and keywords, highest priority first
    rules: Vec<DomainRule>,
}

impl DomainClassifier {
    /// Create a classifier from rules in priority order
    pub fn new(rules: Vec<DomainRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| DomainRule {
                name: rule.name.trim().to_lowercase(),
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .filter(|rule| !rule.name.is_empty())
            .collect();
        Self { rules }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.domains.clone())
    }

    /// Keep only `known_domains`, in priority order
    ///
    /// Rules whose name is not listed are dropped. Listed names without a
    /// rule are appended after the existing rules, matched by their own name.
    /// An empty list leaves the classifier unchanged.
    pub fn restricted_to(&self, known_domains: &[&str]) -> Self {
        if known_domains.is_empty() {
            return self.clone();
        }

        let known: Vec<String> = known_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let mut rules: Vec<DomainRule> = self
            .rules
            .iter()
            .filter(|rule| known.contains(&rule.name))
            .cloned()
            .collect();

        for name in &known {
            if name != GENERAL_DOMAIN && !rules.iter().any(|rule| &rule.name == name) {
                rules.push(DomainRule {
                    name: name.clone(),
                    keywords: Vec::new(),
                });
            }
        }

        Self { rules }
    }

    /// Domain of the first rule with a keyword (or its name) in `text`
    pub fn classify(&self, text: &str) -> &str {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                haystack.contains(rule.name.as_str())
                    || rule.keywords.iter().any(|k| haystack.contains(k.as_str()))
            })
            .map(|rule| rule.name.as_str())
            .unwrap_or(GENERAL_DOMAIN)
    }

    /// Domain names in priority order
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self::new(default_domains())
    }
}

/// Classify `text` with the built-in table restricted to `known_domains`
///
/// Priority is billing, payroll, company, people, reports, wholesale; text
/// matching none of them is `"general"`.
pub fn classify_domain(text: &str, known_domains: &[&str]) -> String {
    DomainClassifier::default()
        .restricted_to(known_domains)
        .classify(text)
        .to_string()
}
