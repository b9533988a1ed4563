//! Step definition file scanner
//!
//! Walks the configured globs under a root and extracts every
//! `Given(...)`, `When(...)` and `Then(...)` registration whose first
//! argument is a string, template or regex literal.

use async_trait::async_trait;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use stepguard_core::{
    OccurrenceRecord, RegistryConfig, Result, ScanConfig, StepGuardError, StepKeyword,
    GENERAL_DOMAIN,
};
use stepguard_registry::DomainClassifier;
use tracing::{debug, info, instrument, warn};

use crate::source::CorpusSource;

fn step_regex() -> &'static Regex {
    static STEP: OnceLock<Regex> = OnceLock::new();
    STEP.get_or_init(|| {
        Regex::new(
            r#"\b(Given|When|Then)\s*\(\s*(?:'((?:[^'\\\n]|\\.)*)'|"((?:[^"\\\n]|\\.)*)"|`((?:[^`\\]|\\.)*)`|/((?:[^/\\\n]|\\.)+)/[a-z]*)"#,
        )
        .expect("step definition regex is valid")
    })
}

/// Scans step definition files into occurrence records
#[derive(Debug, Clone)]
pub struct StepFileScanner {
    root: PathBuf,
    scan: ScanConfig,
    classifier: DomainClassifier,
}

impl StepFileScanner {
    pub fn new(root: impl Into<PathBuf>, scan: ScanConfig, classifier: DomainClassifier) -> Self {
        Self {
            root: root.into(),
            scan,
            classifier,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &RegistryConfig) -> Self {
        Self::new(
            root,
            config.scan.clone(),
            DomainClassifier::from_config(config),
        )
    }

    /// Files matching any step glob, sorted and de-duplicated
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let escaped_root = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut files = BTreeSet::new();

        for pattern in &self.scan.step_globs {
            let full = format!("{}/{}", escaped_root, pattern);
            let paths = glob::glob(&full)
                .map_err(|e| StepGuardError::InvalidGlob(format!("{}: {}", pattern, e)))?;

            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() && !self.is_excluded(&path) => {
                        files.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable path: {}", e),
                }
            }
        }

        debug!("Discovered {} step definition files", files.len());
        Ok(files.into_iter().collect())
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.scan
            .exclude
            .iter()
            .any(|fragment| !fragment.is_empty() && relative.contains(fragment.as_str()))
    }

    /// Path relative to the root with `/` separators
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[async_trait]
impl CorpusSource for StepFileScanner {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load(&self) -> Result<Vec<OccurrenceRecord>> {
        if !self.root.exists() {
            return Err(StepGuardError::Scan(format!(
                "Scan root does not exist: {:?}",
                self.root
            )));
        }

        // Glob expansion stats every candidate path
        let scanner = self.clone();
        let files = tokio::task::spawn_blocking(move || scanner.discover())
            .await
            .map_err(|e| StepGuardError::Scan(format!("File discovery failed: {}", e)))??;
        let mut records = Vec::new();

        // Sequential on purpose: record order must follow path order
        for path in &files {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let found = extract_steps(&self.relative(path), &content, &self.classifier);
                    debug!("{} step definitions in {:?}", found.len(), path);
                    records.extend(found);
                }
                Err(e) => {
                    warn!("Failed to read {:?}: {}", path, e);
                }
            }
        }

        info!(
            "Scanned {} files, found {} step definitions",
            files.len(),
            records.len()
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("scan:{}", self.root.display())
    }
}

/// Extract step registrations from one file's content
///
/// `source_path` becomes the `path:line` source id and is the first input to
/// domain classification; the pattern text is used when the path is neutral.
pub fn extract_steps(
    source_path: &str,
    content: &str,
    classifier: &DomainClassifier,
) -> Vec<OccurrenceRecord> {
    let path_domain = classifier.classify(source_path);

    step_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let keyword: StepKeyword = caps.get(1)?.as_str().parse().ok()?;
            let pattern = literal_text(&caps)?;
            let start = caps.get(0)?.start();
            let line = content[..start].matches('\n').count() + 1;

            let domain = if path_domain == GENERAL_DOMAIN {
                classifier.classify(&pattern)
            } else {
                path_domain
            };

            Some(
                OccurrenceRecord::new(format!("{}:{}", source_path, line))
                    .with_pattern(pattern)
                    .with_keyword(keyword)
                    .with_domain(domain),
            )
        })
        .collect()
}

fn literal_text(caps: &Captures<'_>) -> Option<String> {
    if let Some(m) = caps.get(2) {
        return Some(m.as_str().replace("\\'", "'"));
    }
    if let Some(m) = caps.get(3) {
        return Some(m.as_str().replace("\\\"", "\""));
    }
    if let Some(m) = caps.get(4) {
        return Some(m.as_str().replace("\\`", "`"));
    }
    caps.get(5).map(|m| {
        let body = m.as_str();
        let body = body.strip_prefix('^').unwrap_or(body);
        let body = body.strip_suffix('$').unwrap_or(body);
        body.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BILLING_STEPS: &str = r#"import { Given, When, Then } from '@cucumber/cucumber';

Given('Alex is on the {string} page', async function (name) {});

When("Alex clicks the billing Get Started button", async function () {});

Then(`the plan summary is displayed`, async function () {});

When(/^Alex enters (\d+) seats$/, async function (n) {});
"#;

    #[test]
    fn test_extracts_every_literal_form() {
        let classifier = DomainClassifier::default();
        let records = extract_steps("features/billing/billing.steps.ts", BILLING_STEPS, &classifier);

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].raw_pattern.as_deref(), Some("Alex is on the {string} page"));
        assert_eq!(records[0].keyword, Some(StepKeyword::Given));
        assert_eq!(records[0].source_id, "features/billing/billing.steps.ts:3");
        assert_eq!(records[1].keyword, Some(StepKeyword::When));
        assert_eq!(records[2].raw_pattern.as_deref(), Some("the plan summary is displayed"));
        assert_eq!(records[2].keyword, Some(StepKeyword::Then));
        assert_eq!(records[3].raw_pattern.as_deref(), Some(r"Alex enters (\d+) seats"));
        assert!(records.iter().all(|r| r.domain.as_deref() == Some("billing")));
    }

    #[test]
    fn test_unescapes_quotes() {
        let classifier = DomainClassifier::default();
        let records = extract_steps(
            "common.steps.js",
            r#"Then('Alex\'s payroll is ready', fn); Given("say \"hi\"", fn);"#,
            &classifier,
        );
        assert_eq!(records[0].raw_pattern.as_deref(), Some("Alex's payroll is ready"));
        // Neutral path falls back to the pattern text
        assert_eq!(records[0].domain.as_deref(), Some("payroll"));
        assert_eq!(records[1].raw_pattern.as_deref(), Some("say \"hi\""));
        assert_eq!(records[1].domain.as_deref(), Some(GENERAL_DOMAIN));
    }

    #[test]
    fn test_ignores_non_registrations() {
        let classifier = DomainClassifier::default();
        let records = extract_steps(
            "x.steps.ts",
            "import { Given } from 'x';\nconst Whenever = 1;\nGiven(someVariable, fn);\n",
            &classifier,
        );
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_scan_directory_tree() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("features/billing")).unwrap();
        std::fs::create_dir_all(root.join("features/step_definitions")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();

        std::fs::write(root.join("features/billing/billing.steps.ts"), BILLING_STEPS).unwrap();
        std::fs::write(
            root.join("features/step_definitions/people.js"),
            "Given('an employee named {string} exists', fn);\n",
        )
        .unwrap();
        std::fs::write(
            root.join("node_modules/pkg/vendor.steps.ts"),
            "Given('vendored step', fn);\n",
        )
        .unwrap();
        std::fs::write(root.join("features/readme.md"), "Given('not code', fn)").unwrap();

        let scanner = StepFileScanner::from_config(root, &RegistryConfig::default());
        let files = scanner.discover().unwrap();
        assert_eq!(files.len(), 2);

        let records = scanner.load().await.unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].source_id, "features/billing/billing.steps.ts:3");
        assert_eq!(records[4].source_id, "features/step_definitions/people.js:1");
        assert_eq!(records[4].domain.as_deref(), Some("people"));
        assert!(!records
            .iter()
            .any(|r| r.raw_pattern.as_deref() == Some("vendored step")));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let scanner = StepFileScanner::from_config(
            "/nonexistent/stepguard/root",
            &RegistryConfig::default(),
        );
        let err = scanner.load().await.unwrap_err();
        assert!(matches!(err, StepGuardError::Scan(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_load_reports_invalid_glob() {
        let dir = tempdir().unwrap();
        let scan = ScanConfig {
            step_globs: vec!["[".to_string()],
            exclude: Vec::new(),
        };
        let scanner = StepFileScanner::new(dir.path(), scan, DomainClassifier::default());
        assert!(matches!(
            scanner.load().await,
            Err(StepGuardError::InvalidGlob(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_load_on_current_thread_runtime() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("features/payroll")).unwrap();
        std::fs::write(
            dir.path().join("features/payroll/run.steps.ts"),
            "When('Alex starts a pay run', fn);\n",
        )
        .unwrap();

        let scanner = StepFileScanner::from_config(dir.path(), &RegistryConfig::default());
        let records = scanner.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].domain.as_deref(), Some("payroll"));
    }

    #[test]
    fn test_invalid_glob() {
        let dir = tempdir().unwrap();
        let scan = ScanConfig {
            step_globs: vec!["[".to_string()],
            exclude: Vec::new(),
        };
        let scanner = StepFileScanner::new(dir.path(), scan, DomainClassifier::default());
        assert!(matches!(
            scanner.discover(),
            Err(StepGuardError::InvalidGlob(_))
        ));
    }
}
