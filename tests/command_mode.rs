//! Integration tests for command mode (-e/--edit flag and stdin commands)

use std::io::Write;
use std::process::{Command, Stdio};

fn gridcalc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gridcalc"));
    // Tests must be deterministic and not depend on a user's config.toml.
    cmd.arg("--no-config").env_remove("GRIDCALC_LOG");
    cmd
}

fn run_edits(args: &[&str]) -> (String, String, i32) {
    let output = gridcalc().args(args).output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_stdin(args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = gridcalc()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn gridcalc");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for gridcalc");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_single_edit() {
    let (stdout, _, code) = run_edits(&["-e", "a0=5 + 3"]);
    assert_eq!(stdout.trim(), "a0 = 8");
    assert_eq!(code, 0);
}

#[test]
fn test_propagation_order() {
    let (stdout, _, code) = run_edits(&["-e", "a0=5", "-e", "b0=a0*2", "-e", "c0=b0+1", "-e", "a0=3"]);
    assert_eq!(
        stdout.trim(),
        "a0 = 5\nb0 = 10\nc0 = 11\na0 = 3\nb0 = 6\nc0 = 7"
    );
    assert_eq!(code, 0);
}

#[test]
fn test_cycle_is_reported() {
    let (stdout, stderr, code) = run_edits(&["-e", "a0=b0", "-e", "b0=a0"]);
    assert_eq!(stdout.trim(), "a0 =");
    assert!(stderr.contains("error[CyclicDependency]"), "stderr: {stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_compile_error_is_reported() {
    let (_, stderr, code) = run_edits(&["-e", "a0=(1 +"]);
    assert!(stderr.contains("error[CompileError]"), "stderr: {stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_broken_dependent_is_reported() {
    let (stdout, stderr, code) = run_edits(&["-e", "a0=5", "-e", "b0=a0*2", "-e", "a0='x'"]);
    assert_eq!(stdout.trim(), "a0 = 5\nb0 = 10");
    assert!(stderr.contains("error[EvaluationError]"), "stderr: {stderr}");
    assert!(stderr.contains("b0"), "stderr: {stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_text_and_math() {
    let (stdout, _, code) = run_edits(&["-e", "a0='ab' + 'cd'", "-e", "a1=round(sqrt(2) * 100)"]);
    assert_eq!(stdout.trim(), "a0 = abcd\na1 = 141");
    assert_eq!(code, 0);
}

#[test]
fn test_rows_limit() {
    let (_, stderr, code) = run_edits(&["--rows", "27", "-e", "a0=1"]);
    assert!(stderr.contains("number of rows cannot exceed 26"), "stderr: {stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_cols_flag_extends_grid() {
    let (stdout, _, code) = run_edits(&["--cols", "12", "-e", "a11=1"]);
    assert_eq!(stdout.trim(), "a11 = 1");
    assert_eq!(code, 0);
}

#[test]
fn test_malformed_edit() {
    let (_, stderr, code) = run_edits(&["-e", "nonsense"]);
    assert!(stderr.contains("Expected LABEL=TEXT"), "stderr: {stderr}");
    assert_eq!(code, 1);
}

#[test]
fn test_stdin_session() {
    let input = "a0 = 2\nb0 = a0 ** 10\n:show b0\n:deps a0\n:grid\n:quit\na0 = 3\n";
    let (stdout, _, code) = run_stdin(&["--rows", "2", "--cols", "2"], input);
    assert_eq!(
        stdout,
        "a0 = 2\nb0 = 1024\nb0 [a0 ** 10] = 1024\nb0\n2\t\n1024\t\n"
    );
    assert_eq!(code, 0);
}

#[test]
fn test_stdin_unknown_command() {
    let (_, stderr, code) = run_stdin(&[], ":frobnicate\n");
    assert!(stderr.contains("Unknown command: frobnicate"), "stderr: {stderr}");
    assert_eq!(code, 0);
}
