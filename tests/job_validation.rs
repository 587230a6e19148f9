// tests/job_validation.rs

use std::io::Write;

use tempfile::NamedTempFile;

use benchrunner::errors::RunnerError;
use benchrunner::job::{load_and_validate, parse_and_validate};

#[test]
fn full_descriptor_round_trips_into_a_job() {
    let json = r#"{
        "id": "42",
        "repo_slug": "elixir-ecto/postgrex",
        "branch": "master",
        "commit": "ab12cd",
        "config": {
            "elixir_version": "1.5.2",
            "erlang_version": "20.1.2",
            "environment_variables": {"PG_URL": "postgres:postgres@localhost"},
            "deps": [
                {"image": "postgres:9.6", "wait": {"port": 5432}},
                {"container_name": "cache", "image": "redis:4", "command": "redis-server"}
            ]
        }
    }"#;

    let job = parse_and_validate(json).unwrap();
    assert_eq!(job.id, "42");
    assert_eq!(job.config.deps.len(), 2);
    assert_eq!(job.config.deps[0].slug(), "postgres");
    assert_eq!(job.config.deps[0].wait_port(), Some(5432));
    assert_eq!(job.config.deps[1].slug(), "cache");
    assert_eq!(job.config.deps[1].spec().extra["command"], "redis-server");
}

#[test]
fn dependency_without_any_name_is_rejected_before_synthesis() {
    let json = r#"{
        "id": "1", "repo_slug": "a/b", "branch": "m", "commit": "c",
        "config": {
            "elixir_version": "1.5", "erlang_version": "20",
            "deps": [{"environment": {"A": "1"}}]
        }
    }"#;

    match parse_and_validate(json) {
        Err(RunnerError::InvalidDescriptor(msg)) => {
            assert!(msg.contains("container_name"));
            assert!(msg.contains("#0"));
        }
        other => panic!("Expected InvalidDescriptor, got: {:?}", other),
    }
}

#[test]
fn image_without_repository_part_is_rejected() {
    let json = r#"{
        "id": "1", "repo_slug": "a/b", "branch": "m", "commit": "c",
        "config": {"elixir_version": "1.5", "erlang_version": "20", "deps": [{"image": ":latest"}]}
    }"#;
    assert!(matches!(
        parse_and_validate(json),
        Err(RunnerError::InvalidDescriptor(_))
    ));
}

#[test]
fn duplicate_dependency_names_are_rejected() {
    let json = r#"{
        "id": "1", "repo_slug": "a/b", "branch": "m", "commit": "c",
        "config": {
            "elixir_version": "1.5", "erlang_version": "20",
            "deps": [{"image": "postgres:9.6"}, {"container_name": "postgres"}]
        }
    }"#;
    match parse_and_validate(json) {
        Err(RunnerError::InvalidDescriptor(msg)) => assert!(msg.contains("duplicate")),
        other => panic!("Expected InvalidDescriptor, got: {:?}", other),
    }
}

#[test]
fn unsafe_job_id_is_rejected() {
    let json = r#"{
        "id": "../etc", "repo_slug": "a/b", "branch": "m", "commit": "c",
        "config": {"elixir_version": "1.5", "erlang_version": "20"}
    }"#;
    assert!(matches!(
        parse_and_validate(json),
        Err(RunnerError::InvalidDescriptor(_))
    ));
}

#[test]
fn malformed_json_is_a_json_error() {
    assert!(matches!(
        parse_and_validate("{\"id\": 1"),
        Err(RunnerError::JsonError(_))
    ));
}

#[test]
fn descriptor_file_is_loaded_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"id": "9", "repo_slug": "a/b", "branch": "m", "commit": "c",
            "config": {{"elixir_version": "1.6.0", "erlang_version": "20.2"}}}}"#
    )
    .unwrap();

    let job = load_and_validate(file.path()).unwrap();
    assert_eq!(job.config.elixir_version, "1.6.0");
    assert!(job.config.deps.is_empty());
}

#[test]
fn missing_descriptor_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here.json"),
        Err(RunnerError::IoError(_))
    ));
}
