//! Campaign runner and pipeline behaviour under success, refusal and errors


use mock_collaborators::{MockDeliverer, MockTranslator};
use sendcheck_campaign::{
    CampaignOutcome, CampaignRequest, CampaignRunner, Language, Pipeline, RecordingDeliverer,
};
use sendcheck_core::{ComplianceVerdict, Error, Recipient, SendResult, Template, Violation};
use sendcheck_policy::{ComplianceEvaluator, RuleSet};
use std::sync::Arc;
use std::time::Duration;

fn recipients(n: usize) -> Vec<Recipient> {
    (0..n)
        .map(|i| Recipient::new(format!("user{}@x.com", i), format!("User{}", i)))
        .collect()
}

fn pipeline(deliverer: Arc<MockDeliverer>) -> Pipeline {
    Pipeline::new(
        Arc::new(RuleSet::builtin()),
        Box::new(ComplianceEvaluator::keyword()),
        CampaignRunner::new(deliverer),
    )
}

#[tokio::test]
async fn test_every_recipient_attempted_once_despite_failures() {
    let deliverer = Arc::new(
        MockDeliverer::new()
            .refusing("user1@x.com")
            .erroring("user3@x.com")
            .erroring("user4@x.com"),
    );
    let runner = CampaignRunner::new(deliverer.clone());
    let list = recipients(6);

    let result = runner
        .send(&list, "Hi {first_name}", "s", &ComplianceVerdict::pass())
        .await
        .unwrap();

    assert_eq!(result, SendResult { success_count: 3, failure_count: 3 });
    assert_eq!(result.attempted(), list.len());
    assert_eq!(deliverer.call_count(), 6);

    // sequential mode keeps recipient order, including after a failure
    let expected: Vec<String> = list.iter().map(|r| r.email.clone()).collect();
    assert_eq!(deliverer.attempted(), expected);
}

#[tokio::test]
async fn test_concurrent_send_keeps_counts() {
    let deliverer = Arc::new(
        MockDeliverer::new()
            .erroring("user7@x.com")
            .refusing("user12@x.com")
            .with_latency(Duration::from_millis(2)),
    );
    let runner = CampaignRunner::new(deliverer.clone()).with_concurrency(8);
    let list = recipients(25);

    let result = runner
        .send(&list, "Hi {first_name}", "s", &ComplianceVerdict::pass())
        .await
        .unwrap();

    assert_eq!(result.success_count, 23);
    assert_eq!(result.failure_count, 2);
    assert_eq!(deliverer.call_count(), 25);

    let mut attempted = deliverer.attempted();
    attempted.sort();
    attempted.dedup();
    assert_eq!(attempted.len(), 25);
}

#[tokio::test]
async fn test_blocked_verdict_sends_nothing() {
    let deliverer = Arc::new(MockDeliverer::new());
    let runner = CampaignRunner::new(deliverer.clone()).with_concurrency(4);
    let verdict = ComplianceVerdict::from_violations(vec![Violation::new(
        "guaranteed-returns",
        "guarantee",
        "no",
    )]);

    let err = runner
        .send(&recipients(3), "body", "s", &verdict)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ComplianceBlocked { .. }));
    assert_eq!(deliverer.call_count(), 0);
}

#[tokio::test]
async fn test_end_to_end_blocked_example() {
    let deliverer = Arc::new(MockDeliverer::new());
    let request = CampaignRequest {
        recipients: vec![
            Recipient::new("a@x.com", "Ann"),
            Recipient::new("b@x.com", "Bo"),
        ],
        template: Template::new("Hello {first_name}, guaranteed returns!"),
        subject: "Your Mutual Fund Update".to_string(),
        language: Language::En,
    };

    let outcome = pipeline(deliverer.clone()).run(&request).await.unwrap();

    let CampaignOutcome::Blocked { check } = &outcome else {
        panic!("expected the campaign to be blocked");
    };
    assert!(!check.verdict.passed());
    assert_eq!(check.verdict.violations().len(), 1);
    assert!(!check.report.passed);
    assert_eq!(outcome.send_result(), SendResult::default());
    assert_eq!(deliverer.call_count(), 0);
}

#[tokio::test]
async fn test_end_to_end_passing_campaign_with_translation() {
    let recorder = Arc::new(RecordingDeliverer::new());
    let translator = Arc::new(MockTranslator::new());
    let pipeline = Pipeline::new(
        Arc::new(RuleSet::builtin()),
        Box::new(ComplianceEvaluator::keyword()),
        CampaignRunner::new(recorder.clone()),
    )
    .with_translator(translator.clone());

    let request = CampaignRequest {
        recipients: vec![
            Recipient::new("a@x.com", "Ann"),
            Recipient::new("b@x.com", "Bo"),
        ],
        template: Template::new("<p>Hello {first_name}, your statement is ready.</p>"),
        subject: "Statement".to_string(),
        language: Language::Hi,
    };

    let outcome = pipeline.run(&request).await.unwrap();

    assert_eq!(outcome.send_result(), SendResult { success_count: 2, failure_count: 0 });
    assert_eq!(translator.call_count(), 1);
    let messages = recorder.messages();
    assert_eq!(
        messages[0].body,
        "[hi] <p>Hello Ann, your statement is ready.</p>"
    );
    assert_eq!(outcome.check().visible_text, "Hello {first_name}, your statement is ready.");
}

#[tokio::test]
async fn test_translation_failure_sends_original() {
    let recorder = Arc::new(RecordingDeliverer::new());
    let pipeline = Pipeline::new(
        Arc::new(RuleSet::builtin()),
        Box::new(ComplianceEvaluator::keyword()),
        CampaignRunner::new(recorder.clone()),
    )
    .with_translator(Arc::new(MockTranslator::failing()));

    let request = CampaignRequest {
        recipients: vec![Recipient::new("a@x.com", "Ann")],
        template: Template::new("Hi {first_name}"),
        subject: "s".to_string(),
        language: Language::Fr,
    };

    let outcome = pipeline.run(&request).await.unwrap();
    let CampaignOutcome::Sent { prepared, .. } = &outcome else {
        panic!("expected a send");
    };
    assert!(!prepared.translated);
    assert_eq!(recorder.messages()[0].body, "Hi Ann");
}

#[tokio::test]
async fn test_compliance_runs_on_untranslated_text() {
    let recorder = Arc::new(RecordingDeliverer::new());
    let pipeline = Pipeline::new(
        Arc::new(RuleSet::builtin()),
        Box::new(ComplianceEvaluator::keyword()),
        CampaignRunner::new(recorder.clone()),
    )
    .with_translator(Arc::new(MockTranslator::new()));

    let request = CampaignRequest {
        recipients: vec![Recipient::new("a@x.com", "Ann")],
        template: Template::new("We forecast strong results"),
        subject: "s".to_string(),
        language: Language::De,
    };

    let outcome = pipeline.run(&request).await.unwrap();
    assert!(matches!(outcome, CampaignOutcome::Blocked { .. }));
    assert!(recorder.messages().is_empty());
}

#[tokio::test]
async fn test_dispatch_after_separate_check() {
    let request = CampaignRequest {
        recipients: recipients(2),
        template: Template::new("Hi {first_name}, your statement is ready."),
        subject: "s".to_string(),
        language: Language::En,
    };
    let unused = Arc::new(MockDeliverer::new());
    let pipeline = pipeline(unused.clone());
    let check = pipeline.check(&request.template).await.unwrap();
    assert!(check.verdict.passed());

    let deliverer = Arc::new(MockDeliverer::new());
    let pipeline = pipeline.with_runner(CampaignRunner::new(deliverer.clone()));
    let outcome = pipeline.dispatch(&request, check).await.unwrap();

    assert_eq!(outcome.send_result().success_count, 2);
    assert_eq!(deliverer.call_count(), 2);
    assert_eq!(unused.call_count(), 0);
}

#[tokio::test]
async fn test_dispatch_of_failing_check_is_blocked() {
    let request = CampaignRequest {
        recipients: recipients(2),
        template: Template::new("Guaranteed returns for {first_name}"),
        subject: "s".to_string(),
        language: Language::En,
    };
    let deliverer = Arc::new(MockDeliverer::new());
    let pipeline = pipeline(deliverer.clone());
    let check = pipeline.check(&request.template).await.unwrap();

    let outcome = pipeline.dispatch(&request, check).await.unwrap();
    assert!(matches!(outcome, CampaignOutcome::Blocked { .. }));
    assert_eq!(deliverer.call_count(), 0);
}

#[tokio::test]
async fn test_extraction_failure_stops_pipeline() {
    let deliverer = Arc::new(MockDeliverer::new());
    let request = CampaignRequest {
        recipients: recipients(1),
        template: Template::new("<p>guaranteed <b class=\"x"),
        subject: "s".to_string(),
        language: Language::En,
    };

    let err = pipeline(deliverer.clone()).run(&request).await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));
    assert_eq!(deliverer.call_count(), 0);
}

#[tokio::test]
async fn test_empty_recipients_rejected() {
    let request = CampaignRequest {
        recipients: Vec::new(),
        template: Template::new("Hi"),
        subject: "s".to_string(),
        language: Language::En,
    };
    let err = pipeline(Arc::new(MockDeliverer::new()))
        .run(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InputValidation(_)));
}
