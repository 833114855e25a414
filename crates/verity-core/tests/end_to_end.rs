//! Worker outputs verified end to end against fixture trees

use chrono::Utc;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use verity_claim::{AssertionForm, TextAssertion};
use verity_core::{
    Claim, EvidenceSource, ReportStatus, VerificationConfig, VerificationOrchestrator,
    VerificationReport, WarningCategory, WorkerOutput, CONFIRMATION_STATUS,
};
use verity_test_utils::SourceTree;

fn orchestrator() -> VerificationOrchestrator {
    VerificationOrchestrator::new(Arc::new(VerificationConfig::default()))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn peer(worker: &str, verified_facts: Vec<Claim>) -> VerificationReport {
    VerificationReport {
        worker: worker.to_string(),
        timestamp: Utc::now(),
        verified_facts,
        unverified_claims: Vec::new(),
        warnings: Vec::new(),
        overall_confidence: 1.0,
        status: ReportStatus::Verified,
    }
}

fn function_in(tree: &SourceTree, name: &str) -> Claim {
    Claim::assertion(
        TextAssertion {
            form: AssertionForm::FunctionIn,
            subject: name.to_string(),
            path: tree.path_str("main.py"),
        },
        "",
    )
}

#[tokio::test]
async fn valid_output_is_verified() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .function("main.py", "real_function")
        .analysis("The file {root}/main.py contains real_function and nothing else")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(report.worker, "builder");
    assert_eq!(report.verified_facts.len(), 3);
    assert!(report.unverified_claims.is_empty());
    assert!(report.warnings.is_empty());
    assert!(close(report.overall_confidence, 1.0));
    assert_eq!(report.status, ReportStatus::Verified);
}

#[tokio::test]
async fn invalid_output_fails_with_warnings() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("nonexistent.py")
        .function("main.py", "fake_function")
        .analysis("This should probably work since it typically does")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert!(report.verified_facts.is_empty());
    assert_eq!(report.unverified_claims.len(), 2);
    assert_eq!(report.warnings.len(), 3);
    assert!(close(report.overall_confidence, 0.0));
    assert_eq!(report.status, ReportStatus::Failed);
}

#[tokio::test]
async fn mixed_output_fails_under_default_policy() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .file("missing.py")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(report.verified_facts, vec![Claim::file(tree.path_str("main.py"))]);
    assert_eq!(report.unverified_claims, vec![Claim::file(tree.path_str("missing.py"))]);
    assert!(close(report.overall_confidence, 0.5));
    assert_eq!(report.status, ReportStatus::Failed);

    let lenient = VerificationOrchestrator::new(Arc::new(
        VerificationConfig::default().with_fail_on_unverified(false),
    ));
    let report = lenient.verify_output("builder", &output).await;
    assert_eq!(report.status, ReportStatus::LowConfidence);
}

#[tokio::test]
async fn warnings_lower_confidence() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .function("main.py", "real_function")
        .class("main.py", "RealClass")
        .analysis("It is likely fine and should pass")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(report.verified_facts.len(), 3);
    assert_eq!(report.warnings.len(), 2);
    assert!(close(report.overall_confidence, 0.8));
    assert_eq!(report.status, ReportStatus::LowConfidence);
}

#[tokio::test]
async fn allow_assumptions_exempts_assumption_warnings() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .analysis("The build should pass")
        .build();
    let config = VerificationConfig::default().with_allow_assumptions(true);

    let report = VerificationOrchestrator::new(Arc::new(config))
        .verify_output("builder", &output)
        .await;
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].category, WarningCategory::Assumption);
    assert!(close(report.overall_confidence, 1.0));
    assert_eq!(report.status, ReportStatus::Verified);
}

#[tokio::test]
async fn nonexistent_files_are_never_verified() {
    let tree = SourceTree::new();
    let output = tree
        .output()
        .file("nonexistent_file.py")
        .snippet("nonexistent_file.py", "def hello():")
        .import("nonexistent_file.py", "os")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert!(report.verified_facts.is_empty());
    assert_eq!(report.unverified_claims.len(), 3);
    assert_eq!(report.status, ReportStatus::Failed);
}

#[tokio::test]
async fn invented_function_names_are_rejected() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .function("main.py", "real_function")
        .function("main.py", "fake_function")
        .function("main.py", "RealClass")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(
        report.verified_facts,
        vec![Claim::function(tree.path_str("main.py"), "real_function")]
    );
    assert_eq!(report.unverified_claims.len(), 2);
}

#[tokio::test]
async fn snippets_and_imports() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .snippet("main.py", "def real_function( ):\n  return True")
        .snippet("main.py", "def other():")
        .import("main.py", "typing")
        .import("main.py", "sys")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(report.verified_facts.len(), 2);
    assert_eq!(report.unverified_claims.len(), 2);
}

#[tokio::test]
async fn verification_is_idempotent() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .function("main.py", "fake_function")
        .analysis("This typically works")
        .build();
    let orchestrator = orchestrator();

    let first = orchestrator.verify_output("builder", &output).await;
    let second = orchestrator.verify_output("builder", &output).await;
    assert_eq!(first.verified_facts, second.verified_facts);
    assert_eq!(first.unverified_claims, second.unverified_claims);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.status, second.status);
    assert!(close(first.overall_confidence, second.overall_confidence));
    assert_eq!(orchestrator.evidence_chain().len(), 4);
}

#[tokio::test]
async fn every_verified_fact_has_evidence() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .class("main.py", "RealClass")
        .import("main.py", "os")
        .snippet("main.py", "return True")
        .build();
    let orchestrator = orchestrator();

    let report = orchestrator.verify_output("builder", &output).await;
    assert_eq!(report.verified_facts.len(), 4);
    for fact in &report.verified_facts {
        let entries = orchestrator.evidence_chain().find_by_claim(fact);
        assert!(entries.iter().any(|e| e.verified), "no evidence for {fact}");
    }

    let sources: Vec<EvidenceSource> = orchestrator
        .evidence_chain()
        .export()
        .iter()
        .map(|e| e.source)
        .collect();
    assert!(sources.contains(&EvidenceSource::FileSystem));
    assert!(sources.contains(&EvidenceSource::SourceStructure));
}

#[tokio::test]
async fn malformed_claim_gets_synthetic_warning() {
    let tree = SourceTree::with_sample();
    let json = format!(
        r#"{{"files": ["{}"], "functions": [{{"file": "{}"}}]}}"#,
        tree.path_str("main.py"),
        tree.path_str("main.py")
    );
    let output: WorkerOutput = serde_json::from_str(&json).unwrap();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(report.verified_facts.len(), 1);
    assert_eq!(report.unverified_claims.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].category, WarningCategory::MalformedClaim);
    assert!(report.warnings[0].pattern.contains("symbol"));
    assert_eq!(report.status, ReportStatus::Failed);
}

#[tokio::test]
async fn wrong_typed_entries_become_malformed_claims() {
    let tree = SourceTree::with_sample();
    let main = tree.path_str("main.py");
    let json = format!(
        r#"{{
            "files": ["{main}", null],
            "functions": [{{"file": "{main}", "function": "real_function"}}],
            "classes": [{{"file": "{main}", "class": 7}}]
        }}"#
    );
    let output: WorkerOutput = serde_json::from_str(&json).unwrap();

    let report = orchestrator().verify_output("builder", &output).await;
    assert_eq!(
        report.verified_facts,
        vec![Claim::file(main.clone()), Claim::function(main.clone(), "real_function")]
    );
    assert_eq!(report.unverified_claims.len(), 2);
    let missing: Vec<&str> = report.warnings.iter().map(|w| w.pattern.as_str()).collect();
    assert_eq!(missing, vec!["missing: path", "missing: symbol"]);
    assert!(report
        .warnings
        .iter()
        .all(|w| w.category == WarningCategory::MalformedClaim));
    assert_eq!(report.status, ReportStatus::Failed);
}

#[tokio::test]
async fn free_text_confirmed_by_two_of_three_peers() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .analysis("The worker added function ghost in {root}/main.py yesterday")
        .build();
    let claim = function_in(&tree, "ghost");
    let peers = vec![
        peer("reviewer", vec![claim.clone()]),
        peer("tester", vec![claim.clone()]),
        peer("planner", Vec::new()),
    ];

    let orchestrator = orchestrator();
    let report = orchestrator.verify_with_peers("builder", &output, &peers).await;
    assert_eq!(report.verified_facts.len(), 1);
    assert!(report.verified_facts[0].same_assertion(&claim));
    assert_eq!(report.status, ReportStatus::Verified);

    let sources: Vec<EvidenceSource> = orchestrator
        .evidence_chain()
        .find_by_claim(&claim)
        .iter()
        .map(|e| e.source)
        .collect();
    assert_eq!(sources, vec![EvidenceSource::SourceStructure, EvidenceSource::CrossWorker]);
}

#[tokio::test]
async fn one_peer_is_not_enough() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .analysis("The worker added function ghost in {root}/main.py yesterday")
        .build();
    let claim = function_in(&tree, "ghost");
    let peers = vec![
        peer("reviewer", vec![claim.clone()]),
        peer("reviewer", vec![claim.clone()]),
        peer("builder", vec![claim.clone()]),
    ];

    let report = orchestrator().verify_with_peers("builder", &output, &peers).await;
    assert!(report.verified_facts.is_empty());
    assert_eq!(report.unverified_claims.len(), 1);
    assert_eq!(report.status, ReportStatus::Failed);
}

#[tokio::test]
async fn peers_ignored_when_cross_validation_disabled() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .analysis("See function ghost in {root}/main.py for details")
        .build();
    let claim = function_in(&tree, "ghost");
    let peers = vec![peer("a", vec![claim.clone()]), peer("b", vec![claim])];
    let config = VerificationConfig::default().with_cross_validation(false);

    let report = VerificationOrchestrator::new(Arc::new(config))
        .verify_with_peers("builder", &output, &peers)
        .await;
    assert_eq!(report.unverified_claims.len(), 1);
}

#[tokio::test]
async fn confirmation_requested_for_weak_reports() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .function("main.py", "fake_function")
        .class("main.py", "FakeClass")
        .build();
    let orchestrator = orchestrator();

    let report = orchestrator.verify_output("builder", &output).await;
    let request = orchestrator.confirmation_for(&report).unwrap();
    assert_eq!(request.status, CONFIRMATION_STATUS);
    assert_eq!(request.claims, report.unverified_claims);
    assert_eq!(request.suggested_actions.len(), 4);
}

#[tokio::test]
async fn concurrent_verifications_share_one_chain() {
    let tree = Arc::new(SourceTree::with_sample());
    let orchestrator = Arc::new(orchestrator());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let tree = Arc::clone(&tree);
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                let output = tree
                    .output()
                    .file("main.py")
                    .function("main.py", "real_function")
                    .build();
                orchestrator.verify_output(&format!("worker-{i}"), &output).await
            })
        })
        .collect();

    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.status, ReportStatus::Verified);
    }

    let entries = orchestrator.evidence_chain().export();
    assert_eq!(entries.len(), 16);
    assert!(entries.iter().enumerate().all(|(i, e)| e.sequence == i as u64));
}

#[tokio::test]
async fn report_round_trips_through_json() {
    let tree = SourceTree::with_sample();
    let output = tree
        .output()
        .file("main.py")
        .analysis("Probably fine")
        .build();

    let report = orchestrator().verify_output("builder", &output).await;
    let decoded = VerificationReport::from_json(&report.to_json_pretty().unwrap()).unwrap();
    assert_eq!(decoded, report);
}
