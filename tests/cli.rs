//! End-to-end runs of the `ringbuf_stress` binary

use std::io::Write;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    file.write_all(yaml.as_bytes()).expect("write config");
    file
}

fn run_binary(config: &tempfile::NamedTempFile, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ringbuf_stress"))
        .args(args)
        .env("RINGBUF_STRESS_CONFIG", config.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch ringbuf_stress")
}

#[test]
fn test_one_second_two_workers() {
    let config = write_config("workers: 2\nlog_level: warn\n");
    let started = Instant::now();
    let output = run_binary(&config, &["1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "exit {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout, "stress test\nok\n");
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn test_duration_argument_overrides_config() {
    let config = write_config("duration_secs: 600\nworkers: 2\nlog_level: warn\n");
    let started = Instant::now();
    let output = run_binary(&config, &["0"]);

    assert!(output.status.success());
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn test_malformed_argument_exit_code() {
    let config = write_config("workers: 2\n");
    let output = run_binary(&config, &["ten"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty(), "must not start the run");
    assert!(String::from_utf8_lossy(&output.stderr).contains("usage"));
}

#[test]
fn test_invalid_config_fails_before_run() {
    let config = write_config("capacity: 64\ngeneration_capacity: 128\nworkers: 2\n");
    let output = run_binary(&config, &["1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout.contains("ok"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("generation_capacity"));
}
