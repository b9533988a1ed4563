//! Core type definitions for step registry auditing and resolution

use serde::{Deserialize, Serialize};

/// Domain assigned when no keyword matches
pub const GENERAL_DOMAIN: &str = "general";

/// Canonical marker every placeholder folds into
pub const PARAM_MARKER: &str = "{param}";

/// Gherkin step keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    #[default]
    #[serde(alias = "given")]
    Given,
    #[serde(alias = "when")]
    When,
    #[serde(alias = "then")]
    Then,
}

impl std::fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Given => write!(f, "Given"),
            Self::When => write!(f, "When"),
            Self::Then => write!(f, "Then"),
        }
    }
}

impl std::str::FromStr for StepKeyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "given" => Ok(Self::Given),
            "when" => Ok(Self::When),
            "then" => Ok(Self::Then),
            _ => Err(format!("Invalid step keyword: {}", s)),
        }
    }
}

/// Kind of step a generator is asking for
///
/// Unknown kinds are kept verbatim in [`StepType::Other`] and resolve to `When`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Given,
    Background,
    Navigation,
    Verification,
    Assert,
    Interaction,
    Other(String),
}

impl StepType {
    /// Keyword a resolved step of this type is emitted with
    pub fn keyword(&self) -> StepKeyword {
        match self {
            Self::Given | Self::Background => StepKeyword::Given,
            Self::Verification | Self::Assert => StepKeyword::Then,
            _ => StepKeyword::When,
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Given => write!(f, "given"),
            Self::Background => write!(f, "background"),
            Self::Navigation => write!(f, "navigation"),
            Self::Verification => write!(f, "verification"),
            Self::Assert => write!(f, "assert"),
            Self::Interaction => write!(f, "interaction"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

impl std::str::FromStr for StepType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "given" => Self::Given,
            "background" => Self::Background,
            "navigation" | "navigate" => Self::Navigation,
            "verification" | "verify" => Self::Verification,
            "assert" | "assertion" => Self::Assert,
            "interaction" | "interact" => Self::Interaction,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for StepType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(step_type) => step_type,
            Err(never) => match never {},
        }
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.to_string()
    }
}

/// Unvalidated occurrence as a scanner or exported corpus supplies it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    /// Pattern text exactly as written in the step definition
    #[serde(default)]
    pub raw_pattern: Option<String>,
    /// Keyword the definition was registered with (defaults to `Given`)
    #[serde(default)]
    pub keyword: Option<StepKeyword>,
    /// Domain tag assigned by the scanner
    #[serde(default)]
    pub domain: Option<String>,
    /// Opaque identifier of where the definition lives (e.g. `path:line`)
    #[serde(default)]
    pub source_id: String,
}

impl OccurrenceRecord {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, raw_pattern: impl Into<String>) -> Self {
        self.raw_pattern = Some(raw_pattern.into());
        self
    }

    pub fn with_keyword(mut self, keyword: StepKeyword) -> Self {
        self.keyword = Some(keyword);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// A step definition recorded in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOccurrence {
    pub raw_pattern: String,
    pub normalized_pattern: String,
    pub keyword: StepKeyword,
    pub domain: String,
    pub source_id: String,
    pub is_parameterized: bool,
}

/// Why a record was left out of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingPattern,
    MissingDomain,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPattern => write!(f, "missing pattern"),
            Self::MissingDomain => write!(f, "missing domain"),
        }
    }
}

/// A malformed record rejected before indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOccurrence {
    pub source_id: String,
    pub reason: SkipReason,
}

/// Conflict severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity for a bucket holding `count` occurrences
    pub fn from_count(count: usize) -> Self {
        if count >= 5 {
            Self::High
        } else if count >= 3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Remediation for a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Recommendation {
    /// Occurrences span several domains: qualify each with its domain
    DomainPrefix {
        domains: Vec<String>,
        /// One `{domain}_{pattern}` suggestion per domain, same order as `domains`
        suggestions: Vec<String>,
    },
    /// All occurrences share a domain; prefixing cannot separate them
    MergeOrReword { domain: String },
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainPrefix { suggestions, .. } => {
                write!(f, "prefix with domain: {}", suggestions.join(", "))
            }
            Self::MergeOrReword { domain } => write!(
                f,
                "merge into a single step definition or add distinguishing detail \
                 (all occurrences are in '{}'; prefixing will not separate them)",
                domain
            ),
        }
    }
}

/// A normalized pattern registered more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub normalized_pattern: String,
    pub occurrences: Vec<StepOccurrence>,
    pub severity: Severity,
    pub recommendation: Recommendation,
}

/// A request for a new step from an artifact generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStep {
    pub description: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
}

impl CandidateStep {
    pub fn new(description: impl Into<String>, domain: impl Into<String>, step_type: StepType) -> Self {
        Self {
            description: description.into(),
            domain: domain.into(),
            step_type,
        }
    }
}

/// Where a resolved step's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepSource {
    Existing,
    Adapted,
    Generated,
}

impl std::fmt::Display for StepSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Existing => write!(f, "existing"),
            Self::Adapted => write!(f, "adapted"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// Final step handed back to the artifact writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub keyword: StepKeyword,
    pub text: String,
    pub source: StepSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_source_id: Option<String>,
    /// Similarity of an adapted match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Minting still collided after disambiguation; needs a human
    #[serde(default)]
    pub unresolved: bool,
}

impl ResolvedStep {
    pub fn existing(keyword: StepKeyword, occurrence: &StepOccurrence) -> Self {
        Self {
            keyword,
            text: occurrence.raw_pattern.clone(),
            source: StepSource::Existing,
            origin_source_id: Some(occurrence.source_id.clone()),
            score: None,
            unresolved: false,
        }
    }

    pub fn adapted(keyword: StepKeyword, occurrence: &StepOccurrence, score: f64) -> Self {
        Self {
            keyword,
            text: occurrence.raw_pattern.clone(),
            source: StepSource::Adapted,
            origin_source_id: Some(occurrence.source_id.clone()),
            score: Some(score),
            unresolved: false,
        }
    }

    pub fn generated(keyword: StepKeyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
            source: StepSource::Generated,
            origin_source_id: None,
            score: None,
            unresolved: false,
        }
    }

    pub fn mark_unresolved(mut self) -> Self {
        self.unresolved = true;
        self
    }

    /// Gherkin line for embedding into a feature file
    pub fn to_gherkin(&self) -> String {
        format!("{} {}", self.keyword, self.text)
    }
}
