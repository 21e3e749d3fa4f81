use clap::Parser;
use labdriver::cli::{self, Cli};
use labdriver::prelude::*;
use labdriver::{JsonReportSink, ScenarioRegistry};
use labdriver_tests::{init, scenario, scratch_dir};
use std::fs;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn run_scores_and_writes_report() {
    let addr = init().await.unwrap();
    let dir = scratch_dir("run");

    let mut healthy = scenario("healthy", addr, "/delay/ms/5");
    healthy.db_stats_url = Some(format!("http://{addr}/debug/dbstats"));
    let registry = ScenarioRegistry::from_scenarios([healthy]).unwrap();
    let sink = JsonReportSink::new(&dir);

    let mut out = Vec::<u8>::new();
    cli::run_scenario(
        &registry,
        "healthy",
        &sink,
        CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.starts_with("==> Running scenario: healthy\n"));
    assert!(out.contains(&format!(
        "    Target: http://{addr}/delay/ms/5 | RPS: 10 | Duration: 1s\n"
    )));
    assert!(out.contains(&format!(
        "    Observe db stats: http://{addr}/debug/dbstats\n"
    )));
    assert!(out.contains("SCORE healthy: 100/100 | p95="));
    assert!(out.contains("==> Report: "));

    let reports: Vec<_> = fs::read_dir(&dir).unwrap().collect();
    assert_eq!(reports.len(), 1);
    let path = reports[0].as_ref().unwrap().path();
    let data: RunData = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    assert_eq!(data.scenario, "healthy");
    assert_eq!(data.score, Some(100));
    assert!(data.score_line.unwrap().starts_with("SCORE healthy: 100/100"));
    assert_eq!(data.requests, data.successes + data.failures);

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn failing_target_is_penalized() {
    let addr = init().await.unwrap();
    let dir = scratch_dir("failing");

    let mut failing = scenario("failing", addr, "/status/500");
    failing.duration = Duration::from_secs(1);
    let registry = ScenarioRegistry::from_scenarios([failing]).unwrap();

    let mut out = Vec::<u8>::new();
    cli::run_scenario(
        &registry,
        "failing",
        &JsonReportSink::new(&dir),
        CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();
    let out = String::from_utf8(out).unwrap();

    // Every request failed: 100 - 40.
    assert!(out.contains("SCORE failing: 60/100"), "{out}");
    assert!(out.contains("errRate=100.0%"), "{out}");

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10000)]
async fn report_failure_is_an_error() {
    let addr = init().await.unwrap();
    let dir = scratch_dir("blocked");
    fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("reports");
    fs::write(&blocker, b"").unwrap();

    let mut quick = scenario("quick", addr, "/delay/ms/0");
    quick.duration = Duration::from_secs(1);
    let registry = ScenarioRegistry::from_scenarios([quick]).unwrap();

    let res = cli::run_scenario(
        &registry,
        "quick",
        &JsonReportSink::new(&blocker),
        CancellationToken::new(),
        &mut Vec::<u8>::new(),
    )
    .await;

    let err = res.unwrap_err();
    assert!(err.to_string().starts_with("Failed to generate report"));

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn lists_scenarios_from_file() {
    let dir = scratch_dir("list");
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("scenarios.json");
    fs::write(
        &file,
        r#"[
            {
                "name": "canary",
                "description": "Canary against staging",
                "target_url": "http://staging.internal/health",
                "method": "GET",
                "rps": 2,
                "duration": 5,
                "concurrency": 1,
                "max_p95_ms": 200.0,
                "max_err_rate": 0.0
            }
        ]"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from(["driver", "--scenarios", file.to_str().unwrap(), "list"]).unwrap();
    let mut out = Vec::<u8>::new();
    cli::execute(cli, &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "  canary       Canary against staging\n"
    );

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn invalid_scenario_file_is_an_error() {
    let dir = scratch_dir("invalid");
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("scenarios.json");
    fs::write(&file, "{ not json").unwrap();

    let cli = Cli::try_parse_from(["driver", "--scenarios", file.to_str().unwrap(), "list"]).unwrap();
    let err = cli::execute(cli, &mut Vec::<u8>::new()).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to load scenarios from"));

    fs::remove_dir_all(dir).unwrap();
}
