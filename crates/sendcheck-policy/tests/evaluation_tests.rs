//! Keyword and delegated evaluation through the public evaluator interface

use async_trait::async_trait;
use sendcheck_core::{extract_visible_text, Result};
use sendcheck_policy::{
    Analyze, ComplianceEvaluator, DelegatedEvaluator, Evaluator, EvaluatorStrategy, Rule, RuleSet,
    RuleSetDocument,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn rule_set(rules: Vec<Rule>) -> RuleSet {
    RuleSet::new(RuleSetDocument {
        name: "test".to_string(),
        description: String::new(),
        version: "1".to_string(),
        regulation: None,
        rules,
    })
    .unwrap()
}

#[tokio::test]
async fn test_clean_text_passes_builtin_rules() {
    let evaluator = ComplianceEvaluator::keyword();
    let verdict = evaluator
        .evaluate("Your quarterly statement is attached.", &RuleSet::builtin())
        .await
        .unwrap();

    assert!(verdict.passed());
    assert!(verdict.violations().is_empty());
}

#[tokio::test]
async fn test_text_after_apostrophe_in_unquoted_attribute_is_flagged() {
    let html = "<img alt=Don't miss>We guarantee returns, that's it -> call us";
    let visible = extract_visible_text(html).unwrap();

    let verdict = ComplianceEvaluator::keyword()
        .evaluate(&visible, &RuleSet::builtin())
        .await
        .unwrap();

    assert!(!verdict.passed());
    assert_eq!(verdict.violations()[0].rule_name, "guaranteed-returns");
    assert_eq!(verdict.violations()[0].matched_phrase, "guarantee");
}

#[tokio::test]
async fn test_document_without_head_end_tag_is_evaluated() {
    let html = "<html><head><title>Fund</title><body><p>guaranteed returns</p></body></html>";
    let visible = extract_visible_text(html).unwrap();

    let verdict = ComplianceEvaluator::keyword()
        .evaluate(&visible, &RuleSet::builtin())
        .await
        .unwrap();

    assert!(!verdict.passed());
    assert_eq!(verdict.violations()[0].rule_name, "guaranteed-returns");
}

#[tokio::test]
async fn test_first_violation_belongs_to_first_matching_rule() {
    let rules = rule_set(vec![
        Rule::new("alpha", ["zebra"], "a"),
        Rule::new("beta", ["yak", "xylophone"], "b"),
        Rule::new("gamma", ["walrus"], "c"),
    ]);
    let evaluator = ComplianceEvaluator::keyword();

    // rule order wins over position in the text
    let cases = [
        ("walrus then yak", "beta", "yak"),
        ("a xylophone and a yak", "beta", "yak"),
        ("walrus, yak and zebra", "alpha", "zebra"),
        ("only a WALRUS here", "gamma", "walrus"),
    ];

    for (text, rule, phrase) in cases {
        let verdict = evaluator.evaluate(text, &rules).await.unwrap();
        let first = &verdict.violations()[0];
        assert_eq!(first.rule_name, rule, "text: {}", text);
        assert_eq!(first.matched_phrase, phrase, "text: {}", text);
    }
}

#[tokio::test]
async fn test_one_violation_per_rule() {
    let rules = RuleSet::builtin();
    let verdict = ComplianceEvaluator::keyword()
        .evaluate("A guaranteed return, we guarantee it. Best fund, number one!", &rules)
        .await
        .unwrap();

    let names: Vec<_> = verdict
        .violations()
        .iter()
        .map(|v| v.rule_name.as_str())
        .collect();
    assert_eq!(names, ["guaranteed-returns", "exaggerated-comparison"]);
    assert_eq!(verdict.violations()[0].matched_phrase, "guaranteed return");
    assert_eq!(verdict.violations()[1].matched_phrase, "best fund");
}

#[tokio::test]
async fn test_percentage_needs_qualifier() {
    let rules = RuleSet::builtin();
    let evaluator = ComplianceEvaluator::keyword();

    let plain = evaluator.evaluate("Fees dropped by 2%", &rules).await.unwrap();
    assert!(plain.passed());

    let flagged = evaluator
        .evaluate("Expect 12% annual growth", &rules)
        .await
        .unwrap();
    assert_eq!(flagged.violations()[0].rule_name, "percentage-returns");
}

#[tokio::test]
async fn test_yaml_rule_set_round_trip_through_evaluator() {
    let yaml = r#"
name: house-style
rules:
  - name: no-hype
    trigger_phrases: ["amazing"]
    explanation: Avoid hype words.
  - name: disabled
    trigger_phrases: ["statement"]
    explanation: Never fires.
    enabled: false
"#;
    let rules = RuleSet::from_yaml(yaml).unwrap();
    assert_eq!(rules.active_count(), 1);

    let verdict = ComplianceEvaluator::keyword()
        .evaluate("An AMAZING statement", &rules)
        .await
        .unwrap();
    assert_eq!(verdict.violations().len(), 1);
    assert_eq!(verdict.violations()[0].explanation, "Avoid hype words.");
}

struct CountingAnalyzer {
    answer: String,
    calls: AtomicU32,
}

#[async_trait]
impl Analyze for CountingAnalyzer {
    async fn analyze(&self, _visible_text: &str, rules_description: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        assert!(rules_description.contains("guaranteed-returns"));
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn test_delegated_strategy_orders_by_rule_set() {
    let analyzer = Arc::new(CountingAnalyzer {
        answer: r#"{"compliant": false, "violations": [
            {"rule": "exaggerated-comparison", "phrase": "top pick", "explanation": "superlative"},
            {"rule": "guaranteed-returns", "phrase": "assured income", "explanation": ""}
        ]}"#
        .to_string(),
        calls: AtomicU32::new(0),
    });
    let evaluator = ComplianceEvaluator::Delegated(DelegatedEvaluator::new(analyzer.clone()));
    assert_eq!(evaluator.strategy(), EvaluatorStrategy::Delegated);
    assert!(!evaluator.is_deterministic());

    let verdict = evaluator
        .evaluate("assured income from our top pick", &RuleSet::builtin())
        .await
        .unwrap();

    assert_eq!(analyzer.calls.load(Ordering::Relaxed), 1);
    assert_eq!(verdict.violations()[0].rule_name, "guaranteed-returns");
    assert_eq!(verdict.violations()[0].matched_phrase, "assured income");
    assert!(!verdict.violations()[0].explanation.is_empty());
    assert_eq!(verdict.violations()[1].rule_name, "exaggerated-comparison");
}

#[tokio::test]
async fn test_delegated_unreadable_answer_is_error() {
    let analyzer = Arc::new(CountingAnalyzer {
        answer: "Looks fine to me!".to_string(),
        calls: AtomicU32::new(0),
    });
    let evaluator = ComplianceEvaluator::Delegated(DelegatedEvaluator::new(analyzer));

    let result = evaluator.evaluate("hello", &RuleSet::builtin()).await;
    assert!(result.is_err());
}
