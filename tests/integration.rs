use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn senti_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("senti");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/senti.sqlite"

[server]
bind = "127.0.0.1:5999"

[service]
name = "cli-test"
"#,
        root.display()
    );

    let config_path = config_dir.join("senti.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_senti(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = senti_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run senti binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_senti(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/senti.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_senti(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_senti(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_analyze_prints_all_levels() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_senti(&config_path, &["analyze", "I love this! I hate that."]);
    assert!(success, "analyze failed: stderr={}", stderr);

    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["sentences"].as_array().unwrap().len(), 2);
    assert_eq!(result["paragraphs"].as_array().unwrap().len(), 1);
    assert!(result["document"]["compound"].is_number());
    assert!(result["document"]["pos"].is_number());
    assert_eq!(result["words"]["love"], 3.2);
    assert!(result["process_time"].as_f64().unwrap() >= 0.0);
}

#[test]
fn test_analyze_level_flags() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_senti(
        &config_path,
        &["analyze", "Great day.", "--no-words", "--no-sentences", "--no-paragraphs"],
    );
    assert!(success);

    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert!(result.get("words").is_none());
    assert!(result.get("sentences").is_none());
    assert!(result.get("paragraphs").is_none());
    assert!(result["document"]["compound"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_analyze_reads_file() {
    let (tmp, config_path) = setup_test_env();
    let input = tmp.path().join("review.txt");
    fs::write(&input, "Terrible service.\n\nWonderful food!").unwrap();

    let (stdout, stderr, success) =
        run_senti(&config_path, &["analyze", "--file", input.to_str().unwrap()]);
    assert!(success, "analyze --file failed: stderr={}", stderr);

    let result: Value = serde_json::from_str(&stdout).unwrap();
    let paragraphs = result["paragraphs"].as_array().unwrap();
    assert_eq!(paragraphs.len(), 2);
    assert!(paragraphs[0]["compound"].as_f64().unwrap() < 0.0);
    assert!(paragraphs[1]["compound"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_analyze_empty_text_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_senti(&config_path, &["analyze", ""]);
    assert!(!success);
    assert!(stderr.contains("must not be empty"), "stderr={}", stderr);
}

#[test]
fn test_analyze_does_not_log() {
    let (_tmp, config_path) = setup_test_env();

    run_senti(&config_path, &["init"]);
    run_senti(&config_path, &["analyze", "hello"]);

    let (stdout, _, success) = run_senti(&config_path, &["dump", "queries"]);
    assert!(success);
    let dump: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(dump["contents"].as_array().unwrap().len(), 0);
}

#[test]
fn test_dump_unknown_table_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_senti(&config_path, &["init"]);
    let (_, stderr, success) = run_senti(&config_path, &["dump", "sqlite_master"]);
    assert!(!success);
    assert!(stderr.contains("sqlite_master"), "stderr={}", stderr);
}

#[test]
fn test_status_on_empty_log() {
    let (_tmp, config_path) = setup_test_env();

    run_senti(&config_path, &["init"]);
    let (stdout, stderr, success) = run_senti(&config_path, &["status"]);
    assert!(success, "status failed: stderr={}", stderr);

    let status: Value = serde_json::from_str(&stdout).unwrap();
    assert!(status.get("uptime").is_none());
    assert_eq!(status["num_requests"], 0);
    assert_eq!(status["avg_response_time"], 0.0);
    assert_eq!(status["service_name"], "cli-test");
}

#[test]
fn test_status_include_keys() {
    let (_tmp, config_path) = setup_test_env();

    run_senti(&config_path, &["init"]);
    let (stdout, _, success) = run_senti(
        &config_path,
        &["status", "--include", "service_name,no_such_key"],
    );
    assert!(success);

    let status: Value = serde_json::from_str(&stdout).unwrap();
    let keys: Vec<&String> = status.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["service_name"]);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_senti(&missing, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
