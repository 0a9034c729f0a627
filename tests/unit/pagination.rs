//! Pagination termination through the client facade

use ans_fetch::fetcher::FetcherError;
use ans_fetch::{DownloadError, PagedResource};
use serde_json::json;
use std::sync::Arc;

use crate::support::{client, config, url, MockTransport};

fn page(path: &str, items: u32, page: u32) -> String {
    url(&format!("{path}?items={items}&page={page}"))
}

#[tokio::test]
async fn test_short_page_stops_after_accepting_it() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("assignments/1/results", 2, 1), json!([{"id": 1}, {"id": 2}]))
            .with_response(page("assignments/1/results", 2, 2), json!([{"id": 3}])),
    );
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("assignments/1/results", 2))
        .await
        .unwrap();

    assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 2);
}

#[tokio::test]
async fn test_repeated_page_is_discarded() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("results", 2, 1), json!([{"id": 1}, {"id": 2}]))
            .with_response(page("results", 2, 2), json!([{"id": 1}, {"id": 2}])),
    );
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("results", 2))
        .await
        .unwrap();

    assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_repeat_of_an_earlier_page_also_stops() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("results", 2, 1), json!([1, 2]))
            .with_response(page("results", 2, 2), json!([3, 4]))
            .with_response(page("results", 2, 3), json!([1, 2])),
    );
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("results", 2))
        .await
        .unwrap();

    assert_eq!(items, vec![json!(1), json!(2), json!(3), json!(4)]);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_empty_page_stops() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("results", 2, 1), json!([1, 2]))
            .with_response(page("results", 2, 2), json!([])),
    );
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("results", 2))
        .await
        .unwrap();

    assert_eq!(items, vec![json!(1), json!(2)]);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_empty_first_page_yields_nothing() {
    let transport = Arc::new(MockTransport::new().with_response(page("results", 100, 1), json!([])));
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("results", 100))
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_bare_record_counts_as_single_item_page() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("courses/9", 1, 1), json!({"id": 9}))
            .with_response(page("courses/9", 1, 2), json!({"id": 9})),
    );
    let client = client(transport.clone(), config());

    let items = client
        .get_multiple_pages(&PagedResource::new("courses/9", 1))
        .await
        .unwrap();

    assert_eq!(items, vec![json!({"id": 9})]);
}

#[tokio::test]
async fn test_first_page_and_query_are_carried_on_every_page() {
    let first = url("search/assignments?items=2&page=3&query=name%3Dexam");
    let second = url("search/assignments?items=2&page=4&query=name%3Dexam");
    let transport = Arc::new(
        MockTransport::new()
            .with_response(first.clone(), json!([1, 2]))
            .with_response(second.clone(), json!([3])),
    );
    let client = client(transport.clone(), config());

    let resource = PagedResource::new("search/assignments", 2)
        .with_query("name=exam")
        .with_first_page(3);
    let items = client.get_multiple_pages(&resource).await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(transport.calls(), vec![first, second]);
}

#[tokio::test]
async fn test_failing_page_fails_the_resource() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("results", 2, 1), json!([1, 2]))
            .with_failure(
                page("results", 2, 2),
                FetcherError::HttpError {
                    status: 502,
                    message: "bad gateway".to_string(),
                },
            ),
    );
    let client = client(transport.clone(), config());

    let err = client
        .get_multiple_pages(&PagedResource::new("results", 2))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Fetch(FetcherError::HttpError { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_pages_are_served_from_cache_on_second_run() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(page("results", 2, 1), json!([1, 2]))
            .with_response(page("results", 2, 2), json!([3])),
    );
    let client = client(transport.clone(), config());
    let resource = PagedResource::new("results", 2);

    let first = client.get_multiple_pages(&resource).await.unwrap();
    let second = client.get_multiple_pages(&resource).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 2);
}
