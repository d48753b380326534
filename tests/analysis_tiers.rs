//! Tier orchestration scenarios: duplicate triggers, independence, retries.

mod common;

use common::{orchestrator, wait_for_calls};
use paperscope::model::{BasicAnalysis, Consensus, DeepAnalysis};
use paperscope::service::mock::{MockOp, MockService};
use paperscope::{ServiceError, Tier, TierPayload, TierState, TriggerOutcome};
use std::time::Duration;
use tokio::time::timeout;

fn debate_analysis() -> BasicAnalysis {
    BasicAnalysis {
        summary: "Multi-agent debate improves factual accuracy".into(),
        key_insights: vec!["Debate rounds reduce hallucination".into()],
        methodology: "Controlled comparison across three benchmarks".into(),
        strength_score: 7.5,
        ..Default::default()
    }
}

#[tokio::test]
async fn trigger_while_loading_issues_one_request() {
    let (service, orch) = orchestrator(MockService::new().with_analysis("2501.12345", debate_analysis()));
    service.hold("analyze:2501.12345");

    let first = tokio::spawn({
        let orch = orch.clone();
        async move { orch.analyze("2501.12345", "gemini", None).await }
    });
    wait_for_calls(&service, MockOp::Analyze, 1).await;
    assert!(orch.is_loading("2501.12345", Tier::Basic));

    let duplicate = orch.analyze("2501.12345", "gemini", None).await;
    assert_eq!(duplicate, TriggerOutcome::Ignored);
    assert_eq!(service.calls(MockOp::Analyze), 1);

    service.release("analyze:2501.12345");
    let settled = first.await.unwrap();
    assert!(settled.record().unwrap().state.is_ready());
    assert_eq!(service.calls(MockOp::Analyze), 1);
}

#[tokio::test]
async fn basic_ready_leaves_other_tiers_absent() {
    let (_, orch) = orchestrator(MockService::new().with_analysis("2501.12345", debate_analysis()));
    orch.analyze("2501.12345", "gemini", None).await;

    let [basic, deep, consensus] = orch.records_for("2501.12345");
    assert!(basic.state.is_ready());
    assert_eq!(deep.state, TierState::Absent);
    assert_eq!(consensus.state, TierState::Absent);
    assert_eq!(orch.record_count(), 1);
}

#[tokio::test]
async fn basic_and_consensus_resolve_independently() {
    let consensus = Consensus {
        arxiv_id: "2501.12345".into(),
        agents_compared: vec!["gemini".into(), "openai".into(), "anthropic".into()],
        agreement_score: 0.8,
        synthesized_summary: "Agents agree debate helps on factual QA".into(),
        ..Default::default()
    };
    let (service, orch) = orchestrator(
        MockService::new()
            .with_analysis("2501.12345", debate_analysis())
            .with_consensus("2501.12345", consensus),
    );
    service.hold("analyze:2501.12345");

    let basic = tokio::spawn({
        let orch = orch.clone();
        async move { orch.analyze("2501.12345", "gemini", None).await }
    });
    wait_for_calls(&service, MockOp::Analyze, 1).await;
    assert_eq!(orch.state("2501.12345", Tier::Basic), TierState::Loading);

    // Consensus completes while the basic tier is still in flight
    let consensus = orch.generate_consensus("2501.12345", "gemini", None).await;
    assert!(consensus.record().unwrap().state.is_ready());
    assert_eq!(orch.state("2501.12345", Tier::Basic), TierState::Loading);

    service.release("analyze:2501.12345");
    let record = basic.await.unwrap().record().cloned().unwrap();
    assert_eq!(record.provider.as_deref(), Some("gemini"));
    match record.state.payload() {
        Some(TierPayload::Basic(analysis)) => {
            let score = analysis.strength();
            assert!((0.0..=10.0).contains(&score));
            assert_eq!(score, 7.5);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
    assert!(orch.state("2501.12345", Tier::Consensus).is_ready());
    assert_eq!(orch.state("2501.12345", Tier::Deep), TierState::Absent);
}

#[tokio::test]
async fn out_of_range_strength_is_clamped() {
    let analysis = BasicAnalysis {
        strength_score: 14.0,
        ..Default::default()
    };
    let (_, orch) = orchestrator(MockService::new().with_analysis("2501.12345", analysis));
    let outcome = orch.analyze("2501.12345", "gemini", None).await;
    match outcome.record().and_then(|r| r.state.payload()) {
        Some(TierPayload::Basic(analysis)) => assert_eq!(analysis.strength(), 10.0),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn failing_tier_does_not_touch_others() {
    let (_, orch) = orchestrator(
        MockService::new()
            .with_analysis("2501.12345", debate_analysis())
            .with_deep_analysis(
                "2501.12345",
                14,
                DeepAnalysis {
                    strength_score: 8.0,
                    ..Default::default()
                },
            )
            .with_tier_failure(
                MockOp::Consensus,
                "2501.12345",
                ServiceError::Status {
                    status: 400,
                    detail: Some("At least two analyses are required".into()),
                },
            ),
    );

    orch.analyze("2501.12345", "gemini", None).await;
    orch.analyze_deep("2501.12345", "gemini", None).await;
    orch.generate_consensus("2501.12345", "gemini", None).await;

    assert!(orch.state("2501.12345", Tier::Basic).is_ready());
    assert!(orch.state("2501.12345", Tier::Deep).is_ready());
    assert_eq!(
        orch.state("2501.12345", Tier::Consensus).error(),
        Some("At least two analyses are required")
    );
}

#[tokio::test]
async fn deep_tier_needs_no_basic_analysis() {
    let (_, orch) = orchestrator(MockService::new().with_deep_analysis("2501.12345", 9, DeepAnalysis::default()));
    orch.analyze_deep("2501.12345", "anthropic", None).await;
    assert!(orch.state("2501.12345", Tier::Deep).is_ready());
    assert_eq!(orch.state("2501.12345", Tier::Basic), TierState::Absent);
}

#[tokio::test]
async fn ready_tier_can_be_triggered_again() {
    let (service, orch) = orchestrator(MockService::new().with_analysis("2501.12345", debate_analysis()));
    orch.analyze("2501.12345", "gemini", None).await;
    let again = orch.analyze("2501.12345", "openai", Some("sk-user")).await;

    assert!(again.record().unwrap().state.is_ready());
    assert_eq!(service.calls(MockOp::Analyze), 2);
    let requests = service.analyze_requests();
    assert_eq!(requests[1].provider, "openai");
    assert_eq!(requests[1].api_key.as_deref(), Some("sk-user"));
    assert_eq!(orch.record("2501.12345", Tier::Basic).attempts, 2);
}

#[tokio::test]
async fn dropped_trigger_leaves_tier_retryable() {
    let (service, orch) = orchestrator(MockService::new().with_analysis("2501.12345", debate_analysis()));
    service.hold("analyze:2501.12345");

    let abandoned = timeout(Duration::from_millis(50), orch.analyze("2501.12345", "gemini", None)).await;
    assert!(abandoned.is_err());
    assert!(!orch.is_loading("2501.12345", Tier::Basic));
    assert_eq!(orch.state("2501.12345", Tier::Basic).error(), Some("Analysis failed"));

    service.release("analyze:2501.12345");
    let retry = orch.analyze("2501.12345", "gemini", None).await;
    assert!(retry.record().unwrap().state.is_ready());
    assert_eq!(service.calls(MockOp::Analyze), 2);
}
