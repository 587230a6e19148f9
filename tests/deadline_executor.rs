// tests/deadline_executor.rs
//
// Runs the real compose backend with `sh -c <script>` standing in for the
// orchestration tool.

#![cfg(unix)]

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use benchrunner::engine::Orchestrator;
use benchrunner::exec::{ComposeBackend, TimeoutBoundedExecutor};
use benchrunner::fs::{FileSystem, RealFileSystem};
use benchrunner::types::{RunOutcome, TIMEOUT_LOG, TIMEOUT_STATUS};
use common::{init_tracing, settings_in, with_timeout, JobBuilder, RecordingReclaimer};

fn shell(script: &str) -> TimeoutBoundedExecutor<ComposeBackend> {
    init_tracing();
    TimeoutBoundedExecutor::new(ComposeBackend::new(vec![
        "sh".to_string(),
        "-c".to_string(),
        script.to_string(),
    ]))
}

#[tokio::test]
async fn deadline_shorter_than_tool_runtime_times_out() {
    let exec = shell("sleep 30");

    let started = Instant::now();
    let outcome = with_timeout(exec.run(Path::new("/tmp/x-config.yml"), Duration::from_millis(200))).await;

    assert_eq!(outcome, RunOutcome::TimedOut);
    assert_eq!(outcome.status(), TIMEOUT_STATUS);
    assert_eq!(outcome.log(), TIMEOUT_LOG);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn timed_out_process_tree_is_terminated() {
    let tmp = tempfile::tempdir().unwrap();
    let marker = tmp.path().join("survived");
    // The grandchild would create the marker if it outlived cancellation.
    let script = format!("(sleep 1; touch {}) & wait", marker.display());
    let exec = shell(&script);

    let outcome = with_timeout(exec.run(Path::new("/tmp/x-config.yml"), Duration::from_millis(100))).await;
    assert!(outcome.timed_out());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists(), "background process outlived the deadline");
}

#[tokio::test]
async fn non_zero_exit_is_reported_with_its_log() {
    let exec = shell("echo starting postgres; echo 'runner exited with code 3' >&2; exit 3");
    let outcome = with_timeout(exec.run(Path::new("/tmp/x-config.yml"), Duration::from_secs(5))).await;

    assert_eq!(outcome.status(), 3);
    assert!(outcome.log().contains("starting postgres"));
    assert!(outcome.log().contains("runner exited with code 3"));
}

#[tokio::test]
async fn fast_tool_finishes_well_within_deadline() {
    let exec = shell("exit 0");
    let outcome = with_timeout(exec.run(Path::new("/tmp/x-config.yml"), Duration::from_secs(5))).await;
    assert_eq!(outcome.status(), 0);
    assert!(!outcome.timed_out());
}

fn heartbeats(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[tokio::test]
async fn worker_stays_busy_until_a_term_ignoring_tool_is_killed() {
    init_tracing();
    let out = tempfile::tempdir().unwrap();
    let beats = tempfile::tempdir().unwrap();
    let heartbeat = beats.path().join("heartbeat");
    let script = format!(
        "trap '' TERM; while :; do echo beat >> {}; sleep 0.1; done",
        heartbeat.display()
    );

    let backend = ComposeBackend::new(vec!["sh".into(), "-c".into(), script]);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let settings = settings_in(out.path(), Duration::from_millis(300));
    let orch = Orchestrator::new(settings, backend, RecordingReclaimer::new(), fs).unwrap();

    let job = JobBuilder::new("21").build();
    let run = orch.run_job(&job);
    tokio::pin!(run);

    // Past the deadline but inside the SIGTERM grace period the job still
    // holds the worker.
    let early = tokio::time::timeout(Duration::from_secs(1), &mut run).await;
    assert!(early.is_err(), "job returned before its tool was gone");
    assert!(orch.guard().is_active());
    assert!(orch.guard().acquire().is_err());

    let result = tokio::time::timeout(Duration::from_secs(20), run)
        .await
        .expect("job should finish once the tool is killed")
        .unwrap();
    assert_eq!(result.status, TIMEOUT_STATUS);
    assert_eq!(result.log, TIMEOUT_LOG);
    assert!(!orch.guard().is_active());

    let before = heartbeats(&heartbeat);
    assert!(before > 0);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(heartbeats(&heartbeat), before, "tool kept running after the job ended");
}
