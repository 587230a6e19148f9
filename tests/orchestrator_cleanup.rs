// tests/orchestrator_cleanup.rs

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use benchrunner::engine::Orchestrator;
use benchrunner::errors::RunnerError;
use benchrunner::fs::{FileSystem, RealFileSystem};
use benchrunner::types::{NO_EXIT_STATUS, TIMEOUT_LOG, TIMEOUT_STATUS};
use common::{init_tracing, settings_in, with_timeout, DependencyBuilder, FakeBackend, JobBuilder, RecordingReclaimer};

const INSERT_RESULT: &str = r#"{"statistics": {"average": 12.5, "ips": 80000.0}}"#;
const LOCKFILE: &str = r#"%{
  "poison": {:hex, :poison, "3.1.0", "d9eb6366", [:mix], [], "hexpm"},
  "ecto": {:git, "https://github.com/elixir-ecto/ecto.git", "2f1c3b4a", [branch: "master"]},
}"#;

fn orchestrator(
    root: &Path,
    backend: FakeBackend,
    reclaimer: RecordingReclaimer,
) -> Orchestrator<FakeBackend, RecordingReclaimer> {
    init_tracing();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    Orchestrator::new(settings_in(root, Duration::from_secs(5)), backend, reclaimer, fs).unwrap()
}

#[tokio::test]
async fn successful_run_collects_then_reclaims() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let backend = FakeBackend::exits(0, "benchmarks done\n")
        .with_artifact("insert.json", INSERT_RESULT)
        .with_artifact("mix.lock", LOCKFILE);
    let orch = orchestrator(tmp.path(), backend, reclaimer.clone());

    let job = JobBuilder::new("11")
        .dep(DependencyBuilder::image("postgres:9.6").wait_port(5432).build())
        .build();
    let result = with_timeout(orch.run_job(&job)).await.unwrap();

    assert_eq!(result.job_id, "11");
    assert_eq!(result.status, 0);
    assert!(result.succeeded());
    assert_eq!(result.log, "benchmarks done\n");
    assert_eq!(result.measurements["insert/average"], json!(12.5));
    assert_eq!(result.measurements["insert/ips"], json!(80000.0));

    let context = result.context.expect("context present after a finished run");
    assert_eq!(context.dependency_versions["poison"], "3.1.0");
    assert_eq!(context.dependency_versions["ecto"], "2f1c3b4a");

    let output_dir = tmp.path().join("11");
    assert!(!output_dir.exists());
    assert_eq!(reclaimer.reclaimed(), vec![output_dir.clone()]);
    assert!(!orch.guard().is_active());

    let runs = orch.backend().runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, output_dir.join("11-config.yml"));
    assert!(runs[0].1.contains("job_11_postgres"));
    assert!(runs[0].1.contains("wait-for.sh localhost:5432 -t 200 -- "));
}

#[tokio::test]
async fn tool_failure_is_reported_not_raised() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let orch = orchestrator(
        tmp.path(),
        FakeBackend::exits(2, "runner exited with code 2\n"),
        reclaimer.clone(),
    );

    let job = JobBuilder::new("12").build();
    let result = with_timeout(orch.run_job(&job)).await.unwrap();

    assert_eq!(result.status, 2);
    assert!(!result.succeeded());
    assert!(result.log.contains("code 2"));
    assert!(result.measurements.is_empty());
    let context = result.context.expect("context present after a finished run");
    assert!(context.dependency_versions.is_empty());

    assert!(!tmp.path().join("12").exists());
    assert_eq!(reclaimer.reclaimed().len(), 1);
}

#[tokio::test]
async fn timeout_yields_sentinel_and_still_reclaims() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let orch = orchestrator(tmp.path(), FakeBackend::hangs(), reclaimer.clone());

    let job = JobBuilder::new("13").build();
    let result = with_timeout(orch.run_job_with_deadline(&job, Duration::from_millis(100)))
        .await
        .unwrap();

    assert_eq!(result.status, TIMEOUT_STATUS);
    assert_eq!(result.log, TIMEOUT_LOG);
    assert!(result.measurements.is_empty());
    assert!(result.context.is_none());

    assert!(!tmp.path().join("13").exists());
    assert_eq!(reclaimer.reclaimed().len(), 1);
    assert!(!orch.guard().is_active());

    with_timeout(async {
        while !orch.backend().was_cancelled() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn unrunnable_tool_reports_no_exit_status() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let orch = orchestrator(
        tmp.path(),
        FakeBackend::fails("spawning 'docker-compose': No such file or directory"),
        reclaimer.clone(),
    );

    let result = with_timeout(orch.run_job(&JobBuilder::new("14").build()))
        .await
        .unwrap();

    assert_eq!(result.status, NO_EXIT_STATUS);
    assert!(result.log.contains("No such file or directory"));
    assert!(!tmp.path().join("14").exists());
    assert_eq!(reclaimer.reclaimed().len(), 1);
}

#[tokio::test]
async fn overlapping_job_is_rejected_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let orch = orchestrator(tmp.path(), FakeBackend::hangs(), reclaimer.clone());

    let first = JobBuilder::new("20").build();
    let second = JobBuilder::new("21").build();

    let (first_result, second_result) = with_timeout(async {
        tokio::join!(
            orch.run_job_with_deadline(&first, Duration::from_millis(300)),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                orch.run_job(&second).await
            }
        )
    })
    .await;

    assert!(matches!(
        second_result,
        Err(RunnerError::ConcurrencyViolation(_))
    ));
    assert!(!tmp.path().join("21").exists());

    assert_eq!(first_result.unwrap().status, TIMEOUT_STATUS);
    assert_eq!(reclaimer.reclaimed(), vec![tmp.path().join("20")]);
    assert_eq!(orch.backend().runs().len(), 1);
}

#[tokio::test]
async fn reclaim_failure_is_fatal_and_poisons_the_worker() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::failing();
    let orch = orchestrator(tmp.path(), FakeBackend::exits(0, ""), reclaimer.clone());

    let err = with_timeout(orch.run_job(&JobBuilder::new("30").build()))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, RunnerError::ReclaimFailed(_)));
    assert!(orch.guard().is_active());

    let next = with_timeout(orch.run_job(&JobBuilder::new("31").build())).await;
    assert!(matches!(next, Err(RunnerError::ConcurrencyViolation(_))));
    assert_eq!(reclaimer.reclaimed().len(), 1);
}

#[tokio::test]
async fn sequential_jobs_each_get_a_fresh_directory() {
    let tmp = TempDir::new().unwrap();
    let reclaimer = RecordingReclaimer::new();
    let orch = orchestrator(
        tmp.path(),
        FakeBackend::exits(0, "ok\n").with_artifact("a.json", INSERT_RESULT),
        reclaimer.clone(),
    );

    for id in ["40", "41", "42"] {
        let result = with_timeout(orch.run_job(&JobBuilder::new(id).build()))
            .await
            .unwrap();
        assert_eq!(result.status, 0);
        assert_eq!(result.measurements.len(), 2);
        assert!(!tmp.path().join(id).exists());
    }
    assert_eq!(reclaimer.reclaimed().len(), 3);
}
