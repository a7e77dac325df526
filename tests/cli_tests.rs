//! Integration tests for the CLI application
//!
//! These tests run the compiled `rsmo` binary against temporary data files.

use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

fn training_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "# toy problem").expect("Failed to write");
    writeln!(file, "+1 1:2.0 2:1.0").expect("Failed to write");
    writeln!(file, "-1 1:-2.0 2:-1.0").expect("Failed to write");
    writeln!(file, "+1 1:1.5 2:0.8").expect("Failed to write");
    writeln!(file, "-1 1:-1.5 2:-0.8").expect("Failed to write");
    writeln!(file, "+1 1:1.8 2:0.9").expect("Failed to write");
    writeln!(file, "-1 1:-1.8 2:-0.9").expect("Failed to write");
    file.flush().expect("Failed to flush");
    file
}

fn rsmo(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rsmo"))
        .args(args)
        .output()
        .expect("Failed to run rsmo")
}

fn parse_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "rsmo failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_solve_prints_json() {
    let data = training_file();
    let output = rsmo(&[
        "solve",
        "--data",
        data.path().to_str().unwrap(),
        "--kernel",
        "linear",
        "-C",
        "10",
    ]);
    let json = parse_stdout(&output);

    let alpha = json["alpha"].as_array().expect("alpha array");
    assert_eq!(alpha.len(), 6);
    assert!(alpha.iter().all(|a| a.as_f64().is_some_and(|a| (0.0..=10.0).contains(&a))));
    assert_eq!(json["info"]["upper_bound_p"].as_f64(), Some(10.0));
    assert!(json["info"]["rho"].is_number());
    assert!(json["info"]["iterations"].as_u64().is_some_and(|n| n > 0));
}

#[test]
fn test_cli_huge_cache_size() {
    let data = training_file();
    let cache_mb = usize::MAX.to_string();
    let output = rsmo(&[
        "solve",
        "--data",
        data.path().to_str().unwrap(),
        "--kernel",
        "linear",
        "--cache-size",
        &cache_mb,
    ]);
    let json = parse_stdout(&output);

    assert_eq!(json["alpha"].as_array().map(Vec::len), Some(6));
}

#[test]
fn test_cli_default_gamma_is_inverse_dimension() {
    let data = training_file();
    let path = data.path().to_str().unwrap();
    let auto = parse_stdout(&rsmo(&["solve", "--data", path, "--kernel", "rbf"]));
    let explicit = parse_stdout(&rsmo(&["solve", "--data", path, "--kernel", "rbf", "-g", "0.5"]));

    assert_eq!(auto["alpha"], explicit["alpha"]);
    assert_eq!(auto["info"]["rho"], explicit["info"]["rho"]);
}

#[test]
fn test_cli_solve_writes_output_file() {
    let data = training_file();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("solution.json");

    let output = rsmo(&[
        "solve",
        "--data",
        data.path().to_str().unwrap(),
        "--kernel",
        "rbf",
        "--gamma",
        "0.5",
        "--no-shrinking",
        "--output",
        out_path.to_str().unwrap(),
    ]);

    assert!(
        output.status.success(),
        "solve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());
    let content = std::fs::read_to_string(&out_path).expect("Solution file should exist");
    let json: Value = serde_json::from_str(&content).expect("Solution should be JSON");
    assert_eq!(json["alpha"].as_array().map(Vec::len), Some(6));
}

#[test]
fn test_cli_flags_override_config_file() {
    let data = training_file();
    let mut config = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(config, r#"{{"cp": 3.0, "cn": 3.0, "epsilon": 0.01}}"#).expect("Failed to write");
    config.flush().expect("Failed to flush");

    let output = rsmo(&[
        "solve",
        "--data",
        data.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "--cn",
        "0.25",
    ]);
    let json = parse_stdout(&output);

    assert_eq!(json["info"]["upper_bound_p"].as_f64(), Some(3.0));
    assert_eq!(json["info"]["upper_bound_n"].as_f64(), Some(0.25));
}

#[test]
fn test_cli_polynomial_kernel_and_iteration_cap() {
    let data = training_file();
    let output = rsmo(&[
        "solve",
        "--data",
        data.path().to_str().unwrap(),
        "--kernel",
        "polynomial",
        "--degree",
        "2",
        "--coef0",
        "1",
        "--max-iterations",
        "1",
    ]);
    let json = parse_stdout(&output);

    assert_eq!(json["info"]["iterations"].as_u64(), Some(1));
}

#[test]
fn test_cli_invalid_parameters() {
    let data = training_file();
    let path = data.path().to_str().unwrap();

    let output = rsmo(&["solve", "--data", path, "--cp", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid parameter"));

    let output = rsmo(&["solve", "--data", path, "--gamma", "0"]);
    assert!(!output.status.success());

    let output = rsmo(&["solve", "--data", path, "--kernel", "sigmoid"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_and_malformed_data() {
    let output = rsmo(&["solve", "--data", "/non/existent/file.libsvm"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO error"));

    let mut bad = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(bad, "+1 1:0.5\n-1 0:1.0").expect("Failed to write");
    bad.flush().expect("Failed to flush");
    let output = rsmo(&["solve", "--data", bad.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 2"));
}

#[test]
fn test_cli_help_and_version() {
    let output = rsmo(&["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("solve"));

    let output = rsmo(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
