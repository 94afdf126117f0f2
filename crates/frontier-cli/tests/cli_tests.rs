use std::io::Write;
use std::process::{Command, Output, Stdio};

const TWO_ASSET: &str = "2\n0.10 0.20\n0.04 0.00\n0.00 0.09\n3\n";

/// Run `frontier <args>` with `stdin` piped in.
fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_frontier"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ================================================================
// Success
// ================================================================

#[test]
fn test_solve_prints_frontier_json() {
    let out = run(&["solve"], TWO_ASSET);
    assert!(out.status.success(), "{}", stderr_of(&out));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let frontier = value["frontier"].as_array().unwrap();
    assert_eq!(frontier.len(), 3);
    assert_eq!(frontier[0]["return"], 0.1);
    assert!((frontier[0]["risk"].as_f64().unwrap() - 0.2).abs() < 1e-12);
}

#[test]
fn test_solve_text_output_lines() {
    let out = run(
        &["solve", "--output", "text"],
        "2\n0.10 0.20\n0.04 0.00\n0.00 0.09\n1\n0.15\n",
    );
    assert!(out.status.success(), "{}", stderr_of(&out));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let fields: Vec<f64> = lines[0]
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    assert!((fields[0] - 0.0325_f64.sqrt()).abs() < 1e-12);
    assert_eq!(fields[1], 0.15);
}

#[test]
fn test_extrapolated_target_warns_on_stderr() {
    let out = run(&["solve", "--output", "csv"], "2 0.1 0.2 0.04 0 0 0.09 1 0.3");
    assert!(out.status.success(), "{}", stderr_of(&out));
    assert!(stderr_of(&out).contains("extrapolated"), "{}", stderr_of(&out));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("risk,return\n"), "{}", stdout);
}

// ================================================================
// Failure status and diagnostic
// ================================================================

#[test]
fn test_degenerate_request_exits_nonzero_with_kind() {
    let out = run(&["solve"], "2\n0.1 0.1\n0.04 0.00\n0.00 0.09\n3\n");
    assert_eq!(out.status.code(), Some(1));
    let stderr = stderr_of(&out);
    assert!(stderr.contains("error: degenerate_frontier:"), "{}", stderr);
    assert!(out.stdout.is_empty());
}

#[test]
fn test_malformed_request_exits_nonzero_with_kind() {
    let out = run(&["solve"], "18446744073709551615\n0.1 0.2\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).contains("error: malformed_input:"), "{}", stderr_of(&out));
}

#[test]
fn test_singular_request_exits_nonzero_with_kind() {
    let out = run(&["solve", "--format", "text"], "2 0.1 0.2 0.04 0.08 0.08 0.16 3");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).contains("error: singular_matrix:"), "{}", stderr_of(&out));
}

#[test]
fn test_missing_input_file_exits_nonzero() {
    let out = run(&["solve", "--input", "/nonexistent/request.txt"], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_of(&out).starts_with("error: "), "{}", stderr_of(&out));
}
