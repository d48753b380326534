//! Search session scenarios: stale responses, paging, and load-more guards.

mod common;

use common::{numbered_papers, store, wait_for_calls};
use paperscope::service::mock::{MockOp, MockService};
use paperscope::store::LoadMoreOutcome;
use paperscope::{SearchOutcome, ServiceError};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn only_latest_search_commits() {
    let (service, store) = store(
        MockService::new()
            .with_corpus("llm agents", numbered_papers("2401", 5))
            .with_corpus("multi-agent systems", numbered_papers("2501", 5)),
    );
    service.hold("search:llm agents");

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.search("llm agents", "hysts", 10).await }
    });
    wait_for_calls(&service, MockOp::Search, 1).await;

    let second = store.search("multi-agent systems", "hysts", 10).await;
    assert!(matches!(second, SearchOutcome::Committed(ref p) if p.len() == 5));

    service.release("search:llm agents");
    assert_eq!(first.await.unwrap(), SearchOutcome::Superseded);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.query.as_deref(), Some("multi-agent systems"));
    assert!(snapshot.papers.iter().all(|p| p.id.starts_with("2501.")));
    assert!(!snapshot.searching);
}

#[tokio::test]
async fn multi_agent_systems_pages_in_order() {
    let (service, store) = store(MockService::new().with_corpus("multi-agent systems", numbered_papers("2501", 25)));

    let outcome = store.search("multi-agent systems", "hysts", 10).await;
    let first_page = match outcome {
        SearchOutcome::Committed(papers) => papers,
        other => panic!("search did not commit: {:?}", other),
    };
    assert_eq!(first_page.len(), 10);
    let snapshot = store.snapshot();
    assert!(snapshot.has_more);
    assert_eq!(snapshot.offset, 10);

    let appended = store.load_more(10).await;
    assert!(matches!(appended, LoadMoreOutcome::Appended(ref p) if p.len() == 10));

    let requests = service.search_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].offset, 0);
    assert_eq!(requests[1].offset, 10);
    assert_eq!(requests[1].source, "hysts");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 20);
    assert_eq!(snapshot.offset, 20);
    assert_eq!(&snapshot.papers[..10], &first_page[..]);
    let ids: Vec<_> = snapshot.papers.iter().map(|p| p.id.clone()).collect();
    let expected: Vec<_> = (0..20).map(|i| format!("2501.{:05}", i)).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn offset_advances_by_requested_page_size() {
    let (service, store) = store(MockService::new().with_corpus("agents", numbered_papers("2501", 13)));
    store.search("agents", "hysts", 10).await;
    assert!(matches!(store.load_more(10).await, LoadMoreOutcome::Appended(ref p) if p.len() == 3));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 13);
    assert_eq!(snapshot.offset, 20);
    assert!(!snapshot.has_more);
    assert_eq!(service.calls(MockOp::Search), 2);
}

#[tokio::test]
async fn load_more_before_any_search_is_noop() {
    let (service, store) = store(MockService::new());
    assert_eq!(store.load_more(10).await, LoadMoreOutcome::Skipped);
    assert_eq!(service.calls(MockOp::Search), 0);
}

#[tokio::test]
async fn load_more_while_in_flight_is_noop() {
    let (service, store) = store(MockService::new().with_corpus("agents", numbered_papers("2501", 30)));
    store.search("agents", "hysts", 10).await;

    service.hold("search:agents");
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.load_more(10).await }
    });
    wait_for_calls(&service, MockOp::Search, 2).await;
    assert!(store.snapshot().loading_more);

    assert_eq!(store.load_more(10).await, LoadMoreOutcome::Skipped);
    assert_eq!(service.calls(MockOp::Search), 2);

    service.release("search:agents");
    assert!(matches!(pending.await.unwrap(), LoadMoreOutcome::Appended(_)));
    assert_eq!(store.snapshot().papers.len(), 20);
}

#[tokio::test]
async fn new_search_discards_in_flight_page() {
    let (service, store) = store(
        MockService::new()
            .with_corpus("agents", numbered_papers("2501", 30))
            .with_corpus("robotics", numbered_papers("2502", 4)),
    );
    store.search("agents", "hysts", 10).await;

    service.hold("search:agents");
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.load_more(10).await }
    });
    wait_for_calls(&service, MockOp::Search, 2).await;

    store.search("robotics", "hysts", 10).await;
    service.release("search:agents");
    assert_eq!(pending.await.unwrap(), LoadMoreOutcome::Superseded);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 4);
    assert!(snapshot.papers.iter().all(|p| p.id.starts_with("2502.")));
}

#[tokio::test]
async fn load_more_failure_keeps_loaded_papers() {
    let (_, store) = store(
        MockService::new()
            .with_corpus("agents", numbered_papers("2501", 30))
            .with_page_failure(
                "agents",
                10,
                ServiceError::Status {
                    status: 502,
                    detail: None,
                },
            ),
    );
    store.search("agents", "hysts", 10).await;

    let outcome = store.load_more(10).await;
    assert_eq!(outcome, LoadMoreOutcome::Failed("Load more failed".to_string()));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 10);
    assert_eq!(snapshot.offset, 10);
    assert_eq!(snapshot.load_more_error.as_deref(), Some("Load more failed"));
    assert!(snapshot.search_error.is_none());
    assert!(!snapshot.loading_more);
}

#[tokio::test]
async fn whitespace_query_is_skipped() {
    let (service, store) = store(MockService::new());
    assert_eq!(store.search("   ", "hysts", 10).await, SearchOutcome::Skipped);
    assert_eq!(service.calls(MockOp::Search), 0);
}

#[tokio::test]
async fn repeated_query_commits_only_latest_response() {
    let (service, store) = store(MockService::new().with_corpus("agents", numbered_papers("2501", 12)));
    service.hold("search:agents");

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.search("agents", "hysts", 10).await }
    });
    wait_for_calls(&service, MockOp::Search, 1).await;
    let second = tokio::spawn({
        let store = store.clone();
        async move { store.search("agents", "hysts", 5).await }
    });
    wait_for_calls(&service, MockOp::Search, 2).await;

    // The later request answers first, then the earlier one straggles in
    service.release_nth("search:agents", 2);
    assert!(matches!(second.await.unwrap(), SearchOutcome::Committed(ref p) if p.len() == 5));
    service.release_nth("search:agents", 1);
    assert_eq!(first.await.unwrap(), SearchOutcome::Superseded);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 5);
    assert_eq!(snapshot.offset, 5);
    assert!(!snapshot.searching);
}

#[tokio::test]
async fn dropped_load_more_does_not_block_next_page() {
    let (service, store) = store(MockService::new().with_corpus("agents", numbered_papers("2501", 30)));
    store.search("agents", "hysts", 10).await;

    service.hold("search:agents");
    let abandoned = timeout(Duration::from_millis(50), store.load_more(10)).await;
    assert!(abandoned.is_err());
    assert!(!store.snapshot().loading_more);
    service.release("search:agents");

    assert!(matches!(store.load_more(10).await, LoadMoreOutcome::Appended(ref p) if p.len() == 10));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.papers.len(), 20);
    assert_eq!(snapshot.offset, 20);
}

#[tokio::test]
async fn dropped_search_clears_searching_flag() {
    let (service, store) = store(MockService::new().with_corpus("agents", numbered_papers("2501", 3)));
    service.hold("search:agents");

    let abandoned = timeout(Duration::from_millis(50), store.search("agents", "hysts", 10)).await;
    assert!(abandoned.is_err());
    assert!(!store.snapshot().searching);

    service.release("search:agents");
    assert!(matches!(store.search("agents", "hysts", 10).await, SearchOutcome::Committed(_)));
}
