use labdriver::prelude::*;
use labdriver_tests::init;
use std::time::{Duration, Instant};

fn config(name: &str, url: String, rps: u32, duration: Duration) -> RunConfig {
    RunConfig::new(name, &url, rps, duration)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn paces_to_target_rps() {
    let addr = init().await.unwrap();

    let config = config(
        "rate",
        format!("http://{addr}/delay/ms/0"),
        10,
        Duration::from_secs(1),
    )
    .concurrency(10);
    let mut runner = Runner::new(config).unwrap();
    let data = runner.run(CancellationToken::new()).await;

    assert!(
        (9..=11).contains(&data.requests),
        "requests = {}",
        data.requests
    );
    assert_eq!(data.failures, 0);
    assert_eq!(data.requests, data.successes + data.failures);
    assert_eq!(data.outcome, RunOutcome::Completed);
    assert_eq!(runner.state(), RunState::Completed);
    assert!(data.elapsed >= Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn saturated_workers_queue_issuance() {
    let addr = init().await.unwrap();

    // Each request outlasts the 100ms cadence and only one may be in flight.
    let config = config(
        "saturate",
        format!("http://{addr}/delay/ms/300"),
        10,
        Duration::from_secs(1),
    )
    .concurrency(1);
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    assert!(data.requests < 10, "requests = {}", data.requests);
    assert!(data.requests >= 2, "requests = {}", data.requests);
    assert_eq!(data.failures, 0);
    assert!(data.latencies.p50 >= Duration::from_millis(300));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(5000)]
async fn cancelled_at_start() {
    let addr = init().await.unwrap();

    let config = config(
        "cancel-start",
        format!("http://{addr}/delay/ms/0"),
        100,
        Duration::from_secs(30),
    )
    .concurrency(10);
    let token = CancellationToken::new();
    token.cancel();

    let start = Instant::now();
    let mut runner = Runner::new(config).unwrap();
    let data = runner.run(token).await;

    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(data.requests, 0);
    assert_eq!(data.outcome, RunOutcome::Cancelled);
    assert_eq!(runner.state(), RunState::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(5000)]
async fn cancelled_mid_run_keeps_partial_data() {
    let addr = init().await.unwrap();

    let config = config(
        "cancel-mid",
        format!("http://{addr}/delay/ms/10"),
        20,
        Duration::from_secs(30),
    )
    .concurrency(4);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let data = Runner::new(config).unwrap().run(token).await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(data.outcome, RunOutcome::Cancelled);
    assert!(data.requests > 0);
    assert!(data.requests < 20, "requests = {}", data.requests);
    assert_eq!(data.requests, data.successes + data.failures);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(5000)]
async fn grace_period_bounds_shutdown() {
    let addr = init().await.unwrap();

    let config = config(
        "grace",
        format!("http://{addr}/delay/ms/5000"),
        10,
        Duration::from_millis(200),
    )
    .concurrency(2)
    .request_timeout(Duration::from_secs(30))
    .grace_period(Duration::from_millis(300));

    let start = Instant::now();
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    // Nothing finished inside the grace period; the abandoned requests are not counted.
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(data.requests, 0);
    assert_eq!(data.outcome, RunOutcome::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn non_2xx_is_failure() {
    let addr = init().await.unwrap();

    let config = config(
        "unavailable",
        format!("http://{addr}/status/503"),
        20,
        Duration::from_millis(500),
    )
    .concurrency(4);
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    assert!(data.requests > 0);
    assert_eq!(data.failures, data.requests);
    assert_eq!(data.status_counts.get(&503), Some(&data.requests));
    assert_eq!(data.transport_errors, 0);
    assert_eq!(data.error_rate(), 1.);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn mixed_outcomes_are_each_counted_once() {
    let addr = init().await.unwrap();

    let config = config(
        "flaky",
        format!("http://{addr}/flaky/2"),
        40,
        Duration::from_millis(500),
    )
    .concurrency(8);
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    assert!(data.requests >= 4);
    assert_eq!(data.requests, data.successes + data.failures);
    assert_eq!(data.failures, data.requests / 2);
    assert_eq!(data.latencies.count as u64, data.requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn timeouts_are_transport_failures() {
    let addr = init().await.unwrap();

    let config = config(
        "timeout",
        format!("http://{addr}/delay/ms/2000"),
        10,
        Duration::from_millis(300),
    )
    .concurrency(5)
    .request_timeout(Duration::from_millis(100));
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    assert!(data.requests > 0);
    assert_eq!(data.failures, data.requests);
    assert_eq!(data.transport_errors, data.requests);
    assert!(data.latencies.max < Duration::from_secs(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn sends_method_and_body() {
    let addr = init().await.unwrap();

    let post = config(
        "echo",
        format!("http://{addr}/echo"),
        10,
        Duration::from_millis(300),
    )
    .method("POST")
    .body(r#"{"fast": 100, "slow": 20}"#);
    let data = Runner::new(post)
        .unwrap()
        .run(CancellationToken::new())
        .await;
    assert!(data.requests > 0);
    assert_eq!(data.failures, 0);

    // The echo route only accepts POST.
    let get = config(
        "echo-get",
        format!("http://{addr}/echo"),
        10,
        Duration::from_millis(300),
    );
    let data = Runner::new(get)
        .unwrap()
        .run(CancellationToken::new())
        .await;
    assert!(data.requests > 0);
    assert_eq!(data.status_counts.get(&405), Some(&data.requests));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn latency_percentiles_reflect_target() {
    let addr = init().await.unwrap();

    let config = config(
        "latency",
        format!("http://{addr}/delay/ms/50"),
        20,
        Duration::from_secs(1),
    )
    .concurrency(5);
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    let stats = &data.latencies;
    assert!(stats.count > 0);
    assert!(stats.min >= Duration::from_millis(50));
    assert!(stats.p50 <= stats.p95 && stats.p95 <= stats.p99 && stats.p99 <= stats.max);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn starved_downstream_surfaces_as_latency() {
    let addr = init().await.unwrap();

    // The downstream admits 2 requests per second; the runner asks for 10.
    let config = config(
        "bulkhead",
        format!("http://{addr}/limited/2/delay/ms/0/server/bulkhead"),
        10,
        Duration::from_secs(1),
    )
    .concurrency(5)
    .grace_period(Duration::from_secs(3));
    let data = Runner::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await;

    assert!(data.requests < 10, "requests = {}", data.requests);
    assert_eq!(data.failures, 0);
    assert!(data.latencies.max >= Duration::from_millis(400));
}
