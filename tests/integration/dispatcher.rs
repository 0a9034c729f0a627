//! Batch executor: ordering, deduplication, concurrency bound and failure

use ans_fetch::fetcher::FetcherError;
use ans_fetch::{DownloadError, Job, Notifier, PagedResource, ResponseCache};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::support::{builder, client, config, url, MockTransport};

fn course(id: u64) -> String {
    url(&format!("courses/{id}"))
}

#[tokio::test(start_paused = true)]
async fn test_results_keep_input_order_with_mixed_latency() {
    // Odd jobs are slow network fetches, even jobs are already cached
    let cache = ResponseCache::new();
    let mut transport = MockTransport::new();
    for id in 0..8u64 {
        if id % 2 == 0 {
            cache.put(&course(id), &json!({"id": id}));
        } else {
            transport = transport
                .with_response(course(id), json!({"id": id}))
                .with_delay(course(id), Duration::from_millis(400 - id * 40));
        }
    }
    let transport = Arc::new(transport);
    let client = builder(transport.clone(), config().with_workers(4))
        .with_cache(cache)
        .build()
        .unwrap();

    let jobs = (0..8).map(|id| Job::single(course(id))).collect();
    let results = client.run(jobs).await.unwrap();

    let ids: Vec<u64> = results.iter().filter_map(|v| v["id"].as_u64()).collect();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());
    assert_eq!(transport.call_count(), 4);
    assert_eq!(client.executor().limiter().recorded().await, 4);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_key_in_batch_is_fetched_once() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(course(1), json!({"id": 1}))
            .with_response(course(2), json!({"id": 2}))
            .with_default_delay(Duration::from_millis(100)),
    );
    let client = client(transport.clone(), config().with_workers(4));

    let jobs = vec![
        Job::single(course(1)),
        Job::single(course(1)),
        Job::single(course(2)),
        Job::single(course(1)),
    ];
    let results = client.run(jobs).await.unwrap();

    assert_eq!(
        results,
        vec![json!({"id": 1}), json!({"id": 1}), json!({"id": 2}), json!({"id": 1})]
    );
    assert_eq!(transport.calls_to(&course(1)), 1);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_never_exceeds_worker_count() {
    let mut transport = MockTransport::new().with_default_delay(Duration::from_millis(250));
    for id in 0..10 {
        transport = transport.with_response(course(id), json!({"id": id}));
    }
    let transport = Arc::new(transport);
    let client = client(transport.clone(), config().with_workers(3));

    let jobs = (0..10).map(|id| Job::single(course(id))).collect();
    let results = client.run(jobs).await.unwrap();

    assert_eq!(results.len(), 10);
    assert_eq!(transport.call_count(), 10);
    assert_eq!(transport.max_concurrency(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_single_worker_runs_sequentially_in_order() {
    let mut transport = MockTransport::new().with_default_delay(Duration::from_millis(50));
    for id in 0..5 {
        transport = transport.with_response(course(id), json!({"id": id}));
    }
    let transport = Arc::new(transport);
    let client = client(transport.clone(), config().with_workers(1));

    let jobs = (0..5).rev().map(|id| Job::single(course(id))).collect();
    let results = client.run(jobs).await.unwrap();

    let ids: Vec<u64> = results.iter().filter_map(|v| v["id"].as_u64()).collect();
    assert_eq!(ids, vec![4, 3, 2, 1, 0]);
    assert_eq!(transport.max_concurrency(), 1);
    assert_eq!(
        transport.calls(),
        (0..5).rev().map(course).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_empty_batch_returns_empty() {
    let transport = Arc::new(MockTransport::new());
    let client = client(transport.clone(), config());

    let results = client.run(Vec::new()).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_fails_the_batch() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(course(1), json!({"id": 1}))
            .with_failure(
                course(2),
                FetcherError::HttpError {
                    status: 500,
                    message: "boom".to_string(),
                },
            )
            .with_response(course(3), json!({"id": 3}))
            .with_delay(course(3), Duration::from_secs(5)),
    );
    let client = client(transport.clone(), config().with_workers(3));

    let jobs = (1..=3).map(|id| Job::single(course(id))).collect();
    let err = client.run(jobs).await.unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Fetch(FetcherError::HttpError { status: 500, .. })
    ));
    assert!(client.cache().get(&course(3)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_fails_sequential_batch() {
    let transport = Arc::new(
        MockTransport::new()
            .with_failure(course(1), FetcherError::NetworkError("reset".to_string()))
            .with_response(course(2), json!({"id": 2})),
    );
    let client = client(transport.clone(), config().with_workers(1));

    let jobs = (1..=2).map(|id| Job::single(course(id))).collect();
    let err = client.run(jobs).await.unwrap_err();

    assert!(matches!(err, DownloadError::Fetch(FetcherError::NetworkError(_))));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_paginated_jobs_register_once_per_job() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(url("assignments/1/results?items=2&page=1"), json!([1, 2]))
            .with_response(url("assignments/1/results?items=2&page=2"), json!([3]))
            .with_response(url("assignments/2/results?items=2&page=1"), json!([])),
    );
    let client = client(transport.clone(), config().with_workers(2));

    let jobs = vec![
        Job::paginated(PagedResource::new("assignments/1/results", 2)),
        Job::paginated(PagedResource::new("assignments/2/results", 2)),
    ];
    let results = client.run(jobs).await.unwrap();

    assert_eq!(results, vec![json!([1, 2, 3]), json!([])]);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(client.executor().limiter().recorded().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_progress_text_emitted_once_per_job() {
    let transport = Arc::new(
        MockTransport::new()
            .with_response(course(1), json!({"id": 1}))
            .with_response(course(2), json!({"id": 2})),
    );
    let (notifier, mut rx) = Notifier::channel();
    let client = builder(transport, config().with_workers(2))
        .with_notifier(notifier)
        .build()
        .unwrap();

    let jobs = vec![
        Job::single(course(1)).with_progress("first"),
        Job::single(course(2)).with_progress("second"),
        Job::single(course(1)).with_progress("again"),
        Job::single(course(2)),
    ];
    let results: Vec<Value> = client.run(jobs).await.unwrap();
    assert_eq!(results.len(), 4);

    let mut seen = Vec::new();
    while let Ok(text) = rx.try_recv() {
        seen.push(text);
    }
    seen.sort();
    assert_eq!(seen, vec!["again", "first", "second"]);
}

fn two_page_transport() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::new()
            .with_response(url("assignments/1/results?items=2&page=1"), json!([1, 2]))
            .with_response(url("assignments/1/results?items=2&page=2"), json!([3])),
    )
}

fn results_job() -> Job {
    Job::paginated(PagedResource::new("assignments/1/results", 2))
}

#[tokio::test(start_paused = true)]
async fn test_sequential_paginated_job_registers_each_page() {
    let transport = two_page_transport();
    let client = client(transport.clone(), config().with_workers(1));

    let results = client.run(vec![results_job(), results_job()]).await.unwrap();

    assert_eq!(results, vec![json!([1, 2, 3]), json!([1, 2, 3])]);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 2);

    let again = client.run(vec![results_job()]).await.unwrap();

    assert_eq!(again, vec![json!([1, 2, 3])]);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_pooled_paginated_job_is_cached_under_resource_key() {
    let transport = two_page_transport();
    let client = client(transport.clone(), config().with_workers(3));

    let results = client.run(vec![results_job(), results_job()]).await.unwrap();

    assert_eq!(results, vec![json!([1, 2, 3]), json!([1, 2, 3])]);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 1);
    assert!(client
        .cache()
        .contains(&results_job().request.cache_key(crate::support::BASE)));

    let again = client.run(vec![results_job()]).await.unwrap();

    assert_eq!(again, vec![json!([1, 2, 3])]);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.executor().limiter().recorded().await, 1);
}
