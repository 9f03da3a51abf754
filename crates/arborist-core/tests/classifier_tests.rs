#![allow(clippy::unwrap_used, clippy::expect_used)]

use arborist_core::config::RunConfig;
use arborist_core::model::{Attributes, Verdict};
use arborist_core::policy::DefaultPolicy;
use arborist_core::rules::{Classifier, Predicate, Rule, RuleSet};
use serde_json::json;

fn scenario_a_classifier() -> Classifier {
    Classifier::new(
        RuleSet::new(vec![
            Rule::keep("platform", Predicate::exact_ids(["platform"]), "core tenant"),
            Rule::delete("test-orgs", Predicate::id_prefix("test-org-"), "test tenant"),
        ]),
        DefaultPolicy::Delete,
    )
}

#[test]
fn test_scenario_a_classification() {
    // GIVEN KEEP exact {platform}, DELETE prefix test-org-, default-deny
    let classifier = scenario_a_classifier();
    let attrs = Attributes::new();

    // WHEN classifying the three ids
    let platform = classifier.classify("platform", &attrs);
    let test_org = classifier.classify("test-org-7", &attrs);
    let acme = classifier.classify("acme-corp", &attrs);

    // THEN each verdict comes from the expected source
    assert_eq!(platform.verdict, Verdict::Keep);
    assert_eq!(platform.matched_rule.as_deref(), Some("platform"));

    assert_eq!(test_org.verdict, Verdict::Delete);
    assert_eq!(test_org.matched_rule.as_deref(), Some("test-orgs"));

    assert_eq!(acme.verdict, Verdict::Delete);
    assert_eq!(acme.matched_rule, None);
    assert!(acme.reason.contains("default-deny"));
}

#[test]
fn test_allow_list_wins_even_when_listed_last() {
    // GIVEN a DELETE rule that would match first in file order
    let classifier = Classifier::new(
        RuleSet::new(vec![
            Rule::delete("sandbox", Predicate::name_contains(["name"], "sandbox", true), ""),
            Rule::keep("vip", Predicate::exact_ids(["vip-sandbox"]), "customer"),
        ]),
        DefaultPolicy::Keep,
    );
    let attrs = Attributes::new().with("name", "VIP Sandbox");

    // WHEN classifying an entity both rules match
    let d = classifier.classify("vip-sandbox", &attrs);

    // THEN the KEEP rule wins
    assert_eq!(d.verdict, Verdict::Keep);
    assert_eq!(d.matched_rule.as_deref(), Some("vip"));
}

#[test]
fn test_report_policy_leaves_unmatched_unknown() {
    let classifier = Classifier::new(RuleSet::default(), DefaultPolicy::Report);
    let d = classifier.classify("stray", &Attributes::new());
    assert_eq!(d.verdict, Verdict::Unknown);
}

#[test]
fn test_classifier_compiled_from_toml() {
    // GIVEN a config with every predicate kind
    let config = RunConfig::from_toml_str(
        r#"
root_collection = "orgs"
default_policy = "report"

[[rules]]
name = "core"
verdict = "keep"
predicate = { kind = "exact_id", ids = ["platform"] }

[[rules]]
name = "paying"
verdict = "keep"
predicate = { kind = "field_equals", field = "plan", value = "enterprise" }

[[rules]]
name = "pinned"
verdict = "keep"
predicate = { kind = "tag_contains", field = "tags", tag = "pinned" }

[[rules]]
name = "e2e"
verdict = "delete"
predicate = { kind = "id_regex", pattern = "^e2e-[0-9]+$" }

[[rules]]
name = "qa-names"
verdict = "delete"
predicate = { kind = "name_contains", fields = ["name", "displayName"], needle = "QA", case_insensitive = true }

[[rules]]
name = "tmp"
verdict = "delete"
predicate = { kind = "id_prefix", prefix = "tmp-" }
"#,
    )
    .unwrap();

    // WHEN compiled
    let classifier = config.compile().unwrap();
    let none = Attributes::new();

    // THEN every predicate kind is honoured
    assert_eq!(classifier.rules().len(), 6);
    assert_eq!(classifier.classify("platform", &none).verdict, Verdict::Keep);
    assert_eq!(
        classifier
            .classify("tmp-1", &Attributes::new().with("plan", "enterprise"))
            .verdict,
        Verdict::Keep
    );
    assert_eq!(
        classifier
            .classify("e2e-9", &Attributes::new().with("tags", json!(["pinned"])))
            .verdict,
        Verdict::Keep
    );
    assert_eq!(classifier.classify("e2e-9", &none).verdict, Verdict::Delete);
    assert_eq!(
        classifier
            .classify("x", &Attributes::new().with("displayName", "qa team"))
            .matched_rule
            .as_deref(),
        Some("qa-names")
    );
    assert_eq!(classifier.classify("tmp-2", &none).verdict, Verdict::Delete);
    assert_eq!(classifier.classify("acme", &none).verdict, Verdict::Unknown);
}
