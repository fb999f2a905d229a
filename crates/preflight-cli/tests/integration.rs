//! Integration tests for the preflight command surface

use clap::Parser;
use preflight_cli::{run_cli_with_output, ExitCode, PreflightCli};
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
infra:
  aws:
    dynamodb:
      table_name: cdp-table
    s3:
      bucket_name: cdp-logs
"#;

const SNAPSHOT: &str = r#"
aws:
  dynamodb_tables:
    - table_name: cdp-table
  s3_buckets: []
"#;

fn file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn run(args: &[&str]) -> (ExitCode, String) {
    let cli = PreflightCli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let code = run_cli_with_output(cli, &mut out).await;
    (code, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_validate_reports_failure() {
    let config = file(".yaml", CONFIG);
    let snapshot = file(".yaml", SNAPSHOT);

    let (code, out) = run(&[
        "preflight",
        "validate",
        "--config",
        config.path().to_str().unwrap(),
        "--snapshot",
        snapshot.path().to_str().unwrap(),
        "--tag",
        "aws",
        "--format",
        "json",
    ])
    .await;

    assert_eq!(code, ExitCode::ValidationFailed);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["summary"]["passed"], 1);
    assert_eq!(report["summary"]["failed"], 1);
    let results = &report["groups"][0]["categories"][0]["results"];
    assert_eq!(results[1]["message"], "S3 bucket (cdp-logs) does not exist.");
}

#[tokio::test]
async fn test_validate_single_check_passes() {
    let config = file(".yaml", CONFIG);
    let snapshot = file(".yaml", SNAPSHOT);

    let (code, out) = run(&[
        "preflight",
        "validate",
        "-c",
        config.path().to_str().unwrap(),
        "--snapshot",
        snapshot.path().to_str().unwrap(),
        "--check",
        "aws_dynamodb_table_exists",
    ])
    .await;

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("aws_dynamodb_table_exists"));
}

#[tokio::test]
async fn test_no_checks_ran_is_strict_only() {
    let config = file(".yaml", CONFIG);
    let path = config.path().to_str().unwrap();

    let (code, _) = run(&["preflight", "validate", "-c", path, "--tag", "oracle"]).await;
    assert_eq!(code, ExitCode::Success);

    let (code, _) = run(&["preflight", "validate", "-c", path, "--tag", "oracle", "--strict"]).await;
    assert_eq!(code, ExitCode::NoChecksRan);
}

#[tokio::test]
async fn test_unknown_check_is_invalid_input() {
    let config = file(".yaml", CONFIG);
    let (code, _) = run(&[
        "preflight",
        "validate",
        "-c",
        config.path().to_str().unwrap(),
        "--check",
        "does_not_exist",
    ])
    .await;
    assert_eq!(code, ExitCode::InvalidInput);
}

#[tokio::test]
async fn test_unloadable_inputs_are_invalid_input() {
    let (code, _) = run(&["preflight", "validate", "-c", "/nonexistent/preflight.yaml"]).await;
    assert_eq!(code, ExitCode::InvalidInput);

    let config = file(".yaml", CONFIG);
    let bad_snapshot = file(".yaml", "aws: [not, a, map]\n");
    let (code, _) = run(&[
        "preflight",
        "validate",
        "-c",
        config.path().to_str().unwrap(),
        "--snapshot",
        bad_snapshot.path().to_str().unwrap(),
    ])
    .await;
    assert_eq!(code, ExitCode::InvalidInput);
}

#[tokio::test]
async fn test_without_snapshot_client_checks_error() {
    let config = file(".toml", "[infra.aws.dynamodb]\ntable_name = \"cdp-table\"\n");
    let (code, out) = run(&[
        "preflight",
        "validate",
        "-c",
        config.path().to_str().unwrap(),
        "--check",
        "aws_dynamodb_table_exists",
        "--format",
        "yaml",
    ])
    .await;

    assert_eq!(code, ExitCode::ValidationFailed);
    assert!(out.contains("status: ERROR"));
    assert!(out.contains("kind: client"));
}

#[tokio::test]
async fn test_list_json() {
    let (code, out) = run(&["preflight", "list", "--tag", "azure", "--format", "json"]).await;
    assert_eq!(code, ExitCode::Success);

    let listings: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(listings.len(), 4);
    assert!(listings.iter().all(|l| l["provider"] == "azure"));
}

#[tokio::test]
async fn test_zero_parallelism_is_invalid_input() {
    let config = file(".yaml", CONFIG);
    let (code, out) = run(&[
        "preflight",
        "validate",
        "-c",
        config.path().to_str().unwrap(),
        "--max-parallel",
        "0",
    ])
    .await;
    assert_eq!(code, ExitCode::InvalidInput);
    assert!(out.is_empty());
}
