// Integration tests for the dedup & persistence gate and the on-demand path.

mod common;

use std::sync::Arc;

use rca_core::{
    Incident, IncidentStore, ProviderError, RcaError, RcaFields, RcaReport, ReportStatus,
    ReportStore,
};
use rca_pipeline::{client_message, generate_for_incident, GateOutcome, RcaGate};
use rca_store::InMemoryStore;
use serde_json::json;
use tracing::Span;

use common::{ScriptedProvider, COMPLETE_RCA};

fn gate(store: &Arc<InMemoryStore>, provider: &Arc<ScriptedProvider>) -> RcaGate {
    RcaGate::new(store.clone(), provider.clone(), Span::none())
}

fn incident(id: &str) -> Incident {
    Incident {
        id: id.to_string(),
        description: "Disk full on node-7".to_string(),
        tags: vec!["storage".to_string(), "prod".to_string()],
    }
}

#[tokio::test]
async fn existing_report_short_circuits_without_provider_call() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let existing = RcaReport::open(
        &incident("inc-1"),
        RcaFields {
            rca_description: "already done".to_string(),
            probable_causes: "- x".to_string(),
            impacts: "- y".to_string(),
            recommended_actions: "- z".to_string(),
        },
        "titan",
    );
    store.upsert_report(&existing).await.unwrap();

    let outcome = gate(&store, &provider)
        .ensure_generated("inc-1", || async {
            Err(RcaError::InvalidState("loader must not run".to_string()))
        })
        .await
        .unwrap();

    assert_eq!(outcome, GateOutcome::Existing(existing));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn generates_open_report_from_incident() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let gate = gate(&store, &provider);

    let outcome = gate
        .ensure_generated("inc-7", || async { Ok(Some(incident("inc-7"))) })
        .await
        .unwrap();

    assert!(outcome.is_generated());
    let report = outcome.report();
    assert_eq!(report.incident_id, "inc-7");
    assert_eq!(report.status, ReportStatus::Open);
    assert_eq!(report.tags, vec!["storage", "prod"]);
    assert_eq!(report.provider.as_deref(), Some("scripted"));
    assert_eq!(
        report.fields(),
        RcaFields {
            rca_description: "disk filled up".to_string(),
            probable_causes: "- log rotation disabled".to_string(),
            impacts: "- service downtime".to_string(),
            recommended_actions: "- enable rotation".to_string(),
        }
    );

    let requests = provider.requests();
    assert_eq!(requests[0].description, "Disk full on node-7");
    assert_eq!(requests[0].tag_list(), "storage, prod");
    assert!(gate.exists("inc-7").await.unwrap());
}

#[tokio::test]
async fn sequential_calls_store_one_record() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let gate = gate(&store, &provider);

    let first = gate
        .ensure_generated("inc-2", || async { Ok(Some(incident("inc-2"))) })
        .await
        .unwrap();
    let second = gate
        .ensure_generated("inc-2", || async { Ok(Some(incident("inc-2"))) })
        .await
        .unwrap();

    assert!(first.is_generated());
    assert!(!second.is_generated());
    assert_eq!(first.report().id, second.report().id);
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.report_count().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_leave_exactly_one_record() {
    let store = Arc::new(InMemoryStore::new());
    let provider =
        Arc::new(ScriptedProvider::new().with_delay(std::time::Duration::from_millis(20)));
    let gate = gate(&store, &provider);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let gate = gate.clone();
        tasks.push(tokio::spawn(async move {
            gate.ensure_generated("inc-3", || async { Ok(Some(incident("inc-3"))) })
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.report_count().unwrap(), 1);
    assert!(provider.calls() >= 1);
}

#[tokio::test]
async fn transport_failure_writes_nothing_and_retry_succeeds() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::with_script(vec![Err(
        ProviderError::Transport("connection reset".to_string()),
    )]));
    let gate = gate(&store, &provider);

    let err = gate
        .ensure_generated("inc-4", || async { Ok(Some(incident("inc-4"))) })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RcaError::Generation(ProviderError::Transport(_))
    ));
    assert!(!gate.exists("inc-4").await.unwrap());
    assert_eq!(client_message(&err), "Error generating RCA");

    let retry = gate
        .ensure_generated("inc-4", || async { Ok(Some(incident("inc-4"))) })
        .await
        .unwrap();
    assert!(retry.is_generated());
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn empty_model_output_is_a_generation_error() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::with_script(vec![Ok("   ".to_string())]));
    let err = gate(&store, &provider)
        .ensure_generated("inc-5", || async { Ok(Some(incident("inc-5"))) })
        .await
        .unwrap_err();
    assert!(matches!(err, RcaError::Generation(ProviderError::EmptyResponse)));
    assert_eq!(store.report_count().unwrap(), 0);
}

#[tokio::test]
async fn missing_sections_are_stored_as_sentinels() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::with_script(vec![Ok(
        "RCA Description: partial answer".to_string(),
    )]));
    let outcome = gate(&store, &provider)
        .ensure_generated("inc-6", || async { Ok(Some(incident("inc-6"))) })
        .await
        .unwrap();
    let report = outcome.into_report();
    assert_eq!(report.rca_description, "partial answer");
    assert_eq!(report.impact_on_business, "Impacts section not found.");
    assert!(!report.fields().is_complete());
}

#[tokio::test]
async fn on_demand_missing_incident_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let gate = gate(&store, &provider);

    let err = generate_for_incident(&gate, store.as_ref(), "ghost", false)
        .await
        .unwrap_err();
    assert_eq!(client_message(&err), "Incident not found: ghost");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn on_demand_returns_existing_then_regenerates() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::with_script(vec![
        Ok(COMPLETE_RCA.to_string()),
        Ok("RCA Description: second opinion\nProbable Causes:\n- a\nImpacts:\n- b\nRecommended Actions:\n- c".to_string()),
    ]));
    let gate = gate(&store, &provider);
    store
        .insert_incident(json!({"_id": "inc-8", "description": "API 500s", "tags": ["api"]}))
        .await
        .unwrap();

    let first = generate_for_incident(&gate, store.as_ref(), "inc-8", false).await.unwrap();
    let again = generate_for_incident(&gate, store.as_ref(), "inc-8", false).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(provider.calls(), 1);

    let regenerated = generate_for_incident(&gate, store.as_ref(), "inc-8", true).await.unwrap();
    assert_eq!(regenerated.rca_description, "second opinion");
    assert_ne!(regenerated.id, first.id);
    assert_eq!(store.report_count().unwrap(), 1);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn close_sets_root_cause_and_status() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let gate = gate(&store, &provider);

    let err = gate.close("inc-9", "n/a").await.unwrap_err();
    assert!(matches!(err, RcaError::NotFound(_)));

    gate.ensure_generated("inc-9", || async { Ok(Some(incident("inc-9"))) })
        .await
        .unwrap();
    let closed = gate.close("inc-9", "log rotation cron removed").await.unwrap();
    assert_eq!(closed.status, ReportStatus::Closed);
    assert_eq!(closed.root_cause.as_deref(), Some("log rotation cron removed"));
    assert!(closed.updated_at >= closed.created_at);

    let stored = gate.find("inc-9").await.unwrap().unwrap();
    assert_eq!(stored, closed);
}
