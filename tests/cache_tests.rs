// Cache/refresh coordination: freshness, expiry, single-flight, error sharing

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use racknerd_status::cache::StatsCache;
use racknerd_status::solus_repo::FetchError;

use common::{FakeSource, stats_fixture};

#[tokio::test(start_paused = true)]
async fn fresh_cache_serves_without_a_second_fetch() {
    let source = FakeSource::new();
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    let first = cache.get_stats().await.expect("first fetch");
    let second = cache.get_stats().await.expect("cached read");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(first.fetched_at, second.fetched_at);
}

#[tokio::test(start_paused = true)]
async fn cache_stays_fresh_just_under_the_ttl() {
    let source = FakeSource::new();
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    cache.get_stats().await.expect("first fetch");
    tokio::time::advance(Duration::from_secs(59)).await;
    cache.get_stats().await.expect("still cached");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_cache_triggers_exactly_one_new_fetch() {
    let source = FakeSource::new();
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    let first = cache.get_stats().await.expect("first fetch");
    tokio::time::advance(Duration::from_secs(61)).await;
    let second = cache.get_stats().await.expect("refetch");
    let third = cache.get_stats().await.expect("cached read");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_ne!(first.fetched_at, second.fetched_at);
    assert_eq!(second, third);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_a_single_fetch() {
    let source = FakeSource::new().with_delay(Duration::from_millis(50));
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.get_stats().await }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("join").expect("fetch"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_the_same_error() {
    let source = FakeSource::new()
        .with_delay(Duration::from_millis(50))
        .with_script([Err(FetchError::Upstream("upstream returned 503".into()))]);
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.get_stats().await }));
    }
    let mut errors = Vec::new();
    for handle in handles {
        errors.push(handle.await.expect("join").expect_err("scripted failure"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for error in &errors[1..] {
        assert_eq!(error, &errors[0]);
    }
}

#[tokio::test(start_paused = true)]
async fn failed_first_fetch_returns_the_error_and_caches_nothing() {
    let source =
        FakeSource::new().with_script([Err(FetchError::Transport("connection refused".into()))]);
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    cache.get_stats().await.expect_err("first fetch fails");
    let recovered = cache.get_stats().await.expect("retry succeeds");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(recovered, stats_fixture(2));
}

#[tokio::test(start_paused = true)]
async fn stale_value_is_not_served_after_a_failed_refresh() {
    let source = FakeSource::new().with_script([
        Ok(stats_fixture(1)),
        Err(FetchError::Upstream("upstream returned 500".into())),
    ]);
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    cache.get_stats().await.expect("initial fetch");
    tokio::time::advance(Duration::from_secs(61)).await;
    cache
        .get_stats()
        .await
        .expect_err("failed refresh surfaces the error");
    let third = cache.get_stats().await.expect("next call fetches again");

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(third, stats_fixture(3));
}

#[tokio::test(start_paused = true)]
async fn late_arrivals_during_a_refresh_do_not_start_another() {
    let source = FakeSource::new().with_delay(Duration::from_millis(100));
    let calls = source.calls.clone();
    let cache = StatsCache::new(source);

    let early = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get_stats().await })
    };
    // Let the first caller start its refresh before the second arrives.
    tokio::time::advance(Duration::from_millis(10)).await;
    let late = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get_stats().await })
    };

    let early = early.await.expect("join").expect("fetch");
    let late = late.await.expect("join").expect("fetch");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(early, late);
}
