//! CLI tests for `gradebook run`, `report` and `clean`.
//!
//! Spawns the gradebook binary against a temporary submissions directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use grader::test_support::{COMPLETE_SUBMISSION, skip_without_python, write_submission};

const OFFLINE_CONFIG: &str = "interpreter = [\"definitely-not-a-python-interpreter\"]\nsettle_millis = 0\n";

fn gradebook(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gradebook"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("gradebook")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn run_prints_one_line_per_submission() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("grader.toml"), OFFLINE_CONFIG).expect("config");
    write_submission(temp.path(), "bob.py", "def main():\n    pass\n");
    write_submission(temp.path(), "amy.py", "def main(:\n");

    let output = gradebook(temp.path(), &["run", "."]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "grade: submission=amy score=0 status=launch_failed\n\
         grade: submission=bob score=0 status=launch_failed\n\
         run: submissions=2 failed=0\n"
    );
    assert!(temp.path().join("amy").join("grade.txt").exists());
    assert!(temp.path().join("grades.csv").exists());
}

#[test]
fn invalid_config_exits_with_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("grader.toml"), "timeout_secs = 0\n").expect("config");

    let output = gradebook(temp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("timeout_secs must be > 0"));
}

#[test]
fn zero_timeout_override_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = gradebook(temp.path(), &["run", "--timeout-secs", "0"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn report_and_clean_follow_a_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("grader.toml"), OFFLINE_CONFIG).expect("config");
    write_submission(temp.path(), "cat.py", "def main():\n    pass\n");
    assert_eq!(gradebook(temp.path(), &["run"]).status.code(), Some(0));

    let report = gradebook(temp.path(), &["report"]);
    assert_eq!(report.status.code(), Some(0));
    let text = stdout(&report);
    assert!(text.contains("report: submissions=1 zeroed=1"));
    assert!(text.contains("report: avg_score=0.00"));
    assert!(text.contains("report: rule function: Implemented and displayed menu in main() 1/1"));

    let clean = gradebook(temp.path(), &["clean"]);
    assert_eq!(clean.status.code(), Some(0));
    assert!(!temp.path().join("cat").exists());
    assert!(!temp.path().join("grades.csv").exists());
    assert!(temp.path().join("cat.py").exists());
}

#[test]
fn complete_submission_scores_full_marks() {
    if skip_without_python("complete_submission_scores_full_marks") {
        return;
    }
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("grader.toml"), "settle_millis = 0\n").expect("config");
    write_submission(temp.path(), "dana.py", COMPLETE_SUBMISSION);

    let output = gradebook(temp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("grade: submission=dana score=100 status=completed"));
}
