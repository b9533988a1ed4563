//! Resolution guarantees against realistic corpora.

use stepguard_core::{CandidateStep, OccurrenceRecord, StepSource, StepType};
use stepguard_registry::{build_index, detect_conflicts, normalize, CorpusIndex};
use stepguard_resolver::{resolve, StepResolver, DEFAULT_REUSE_THRESHOLD};

fn record(source: &str, pattern: &str, domain: &str) -> OccurrenceRecord {
    OccurrenceRecord::new(source)
        .with_pattern(pattern)
        .with_domain(domain)
}

fn corpus() -> Vec<OccurrenceRecord> {
    vec![
        record(
            "features/billing/billing.steps.ts:12",
            "Alex clicks the billing Get Started button",
            "billing",
        ),
        record(
            "features/billing/billing.steps.ts:30",
            "Alex navigates to page",
            "billing",
        ),
        record(
            "features/common/auth.steps.ts:4",
            "Alex is logged in as {string}",
            "general",
        ),
        record(
            "features/payroll/payroll.steps.ts:8",
            "the pay run summary is displayed",
            "payroll",
        ),
    ]
}

#[test]
fn test_exact_text_is_reused() {
    let index = build_index(corpus()).index;
    let candidate = CandidateStep::new(
        "Alex clicks the billing Get Started button",
        "billing",
        StepType::Interaction,
    );

    let step = resolve(&candidate, &index, DEFAULT_REUSE_THRESHOLD);
    assert_eq!(step.source, StepSource::Existing);
    assert_eq!(step.text, "Alex clicks the billing Get Started button");
    assert_eq!(
        step.origin_source_id.as_deref(),
        Some("features/billing/billing.steps.ts:12")
    );
}

#[test]
fn test_exact_reuse_wins_over_adaptation_at_zero_threshold() {
    let index = build_index(corpus()).index;
    let candidate = CandidateStep::new("alex is logged in as {name}", "people", StepType::Given);

    let step = resolve(&candidate, &index, 0.0);
    assert_eq!(step.source, StepSource::Existing);
    assert_eq!(step.text, "Alex is logged in as {string}");
}

#[test]
fn test_minted_step_does_not_collide_with_other_domain() {
    let records = corpus();
    let index = build_index(records.clone()).index;
    let candidate = CandidateStep::new("Alex navigates to page", "payroll", StepType::Navigation);

    let resolver = StepResolver::new(&index, DEFAULT_REUSE_THRESHOLD).unwrap();
    let step = resolver.resolve(&candidate);

    assert_eq!(step.source, StepSource::Generated);
    assert!(!step.unresolved);
    assert_ne!(step.text, "Alex navigates to page");
    assert_eq!(step.text, "Alex navigates to payroll page");
    assert!(resolver.validate(&step));

    // Re-indexing the minted text beside the corpus creates no new conflict
    let before = detect_conflicts(&index).len();
    let mut extended = records;
    extended.push(record("generated:1", &step.text, "payroll"));
    let after_index = build_index(extended).index;
    assert_eq!(detect_conflicts(&after_index).len(), before);
    assert_eq!(after_index.lookup(&normalize(&step.text)).len(), 1);
}

#[test]
fn test_empty_corpus_always_mints() {
    let index = CorpusIndex::new();
    let candidates = [
        CandidateStep::new("Alex navigates to page", "billing", StepType::Navigation),
        CandidateStep::new("the invoice is displayed", "billing", StepType::Verification),
        CandidateStep::new("Alex clicks the save button", "company", StepType::Interaction),
        CandidateStep::new("", "people", StepType::Background),
    ];

    for candidate in &candidates {
        let step = resolve(candidate, &index, 0.0);
        assert_eq!(step.source, StepSource::Generated, "{:?}", candidate);
        assert!(!step.unresolved);
        assert_eq!(step.keyword, candidate.step_type.keyword());
    }
}

#[test]
fn test_every_resolution_passes_validation_or_is_flagged() {
    let index = build_index(corpus()).index;
    let resolver = StepResolver::new(&index, DEFAULT_REUSE_THRESHOLD).unwrap();

    let candidates = [
        CandidateStep::new("Alex navigates to page", "billing", StepType::Navigation),
        CandidateStep::new("Alex navigates to page", "payroll", StepType::Navigation),
        CandidateStep::new("the pay run summary is displayed", "reports", StepType::Verification),
        CandidateStep::new("Alex clicks the Get Started button", "wholesale", StepType::Interaction),
        CandidateStep::new("", "general", StepType::Other("upload".to_string())),
    ];

    for candidate in &candidates {
        let step = resolver.resolve(candidate);
        assert_eq!(resolver.validate(&step), !step.unresolved, "{:?}", step);
    }
}

#[test]
fn test_resolved_step_serializes_for_writers() {
    let index = build_index(corpus()).index;
    let step = resolve(
        &CandidateStep::new("the invoice list is displayed", "billing", StepType::Assert),
        &index,
        DEFAULT_REUSE_THRESHOLD,
    );

    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(json["source"], "generated");
    assert_eq!(json["keyword"], "Then");
    assert_eq!(json["unresolved"], false);
    assert_eq!(step.to_gherkin(), format!("Then {}", step.text));
}
