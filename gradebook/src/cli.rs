//! CLI command implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use grader::core::rubric::Rule;
use grader::io::config::{CONFIG_FILE, GraderConfig, load_config};
use grader::io::extract::discover_submissions;
use grader::io::report::GRADE_TEXT_FILE;
use grader::pipeline::BatchContext;
use tracing::debug;

use crate::batch;
use crate::summary::aggregate;

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("submissions directory not found: {}", dir.display());
    }
    Ok(())
}

fn resolve_config(dir: &Path, config: Option<&Path>) -> Result<GraderConfig> {
    let path = config.map_or_else(|| dir.join(CONFIG_FILE), Path::to_path_buf);
    debug!(path = %path.display(), "loading config");
    load_config(&path).context("load config")
}

/// Grade every submission in `dir`.
pub fn run_batch(dir: &Path, config: Option<&Path>, timeout_secs: Option<u64>) -> Result<()> {
    ensure_dir(dir)?;
    let mut cfg = resolve_config(dir, config)?;
    if let Some(timeout_secs) = timeout_secs {
        cfg.timeout_secs = timeout_secs;
        cfg.validate().context("validate overrides")?;
    }

    let ctx = BatchContext::new(cfg, dir).context("prepare batch")?;
    let summary = batch::run(&ctx, |entry| {
        println!(
            "grade: submission={} score={} status={}",
            entry.submission, entry.score, entry.status
        );
    })?;
    println!(
        "run: submissions={} failed={}",
        summary.entries.len(),
        summary.failed
    );
    Ok(())
}

/// Print the configured rubric in evaluation order.
pub fn print_rubric(config: Option<&Path>) -> Result<()> {
    let cfg = resolve_config(Path::new("."), config)?;
    for rule in &cfg.rubric {
        println!("{}", describe_rule(rule));
    }
    println!(
        "rubric: baseline={} unconditional_loop_penalty={}",
        cfg.baseline, cfg.unconditional_loop_penalty
    );
    Ok(())
}

fn describe_rule(rule: &Rule) -> String {
    let target = match rule {
        Rule::Function { name, required, .. } => format!("name={name} required={required}"),
        Rule::Code { check, .. } => format!("check={check}"),
        Rule::Output { phrase, .. } => format!("phrase={phrase:?}"),
    };
    format!(
        "rubric: {} {} points={} description={:?}",
        rule.kind(),
        target,
        rule.points(),
        rule.description()
    )
}

/// Summarize the reports written by a previous run.
pub fn report(dir: &Path) -> Result<()> {
    ensure_dir(dir)?;
    let (summary, warnings) = aggregate(dir)?;
    println!(
        "report: submissions={} zeroed={}",
        summary.submissions, summary.zeroed
    );
    if let Some(avg) = summary.avg_score {
        println!("report: avg_score={avg:.2}");
    }
    for (status, count) in summary.statuses {
        println!("report: status {status} {count}");
    }
    for (label, (passed, total)) in summary.rule_pass_rates {
        println!("report: rule {label} {passed}/{total}");
    }
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// Remove per-submission report folders and the ledger.
pub fn clean(dir: &Path) -> Result<()> {
    ensure_dir(dir)?;
    let cfg = resolve_config(dir, None)?;

    let mut removed = 0usize;
    for folder in report_folders(dir, &cfg)? {
        fs::remove_dir_all(&folder).with_context(|| format!("remove {}", folder.display()))?;
        removed += 1;
    }

    let ledger = dir.join(&cfg.ledger_file);
    if ledger.exists() {
        fs::remove_file(&ledger).with_context(|| format!("remove {}", ledger.display()))?;
    }

    println!("clean: folders={} ledger={}", removed, ledger.display());
    Ok(())
}

/// Folders named after a submission that hold a written report.
fn report_folders(dir: &Path, cfg: &GraderConfig) -> Result<Vec<PathBuf>> {
    let folders = discover_submissions(dir, &cfg.exclude)?
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_owned();
            let folder = dir.join(stem);
            folder.join(GRADE_TEXT_FILE).is_file().then_some(folder)
        })
        .collect();
    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader::core::rubric::default_rubric;
    use grader::test_support::write_submission;
    use tempfile::tempdir;

    #[test]
    fn describes_each_rule_kind() {
        let lines: Vec<String> = default_rubric().iter().map(describe_rule).collect();
        assert_eq!(
            lines[0],
            "rubric: output phrase=\"Full Name:\" points=5 description=\"Student info displayed via show_student_information()\""
        );
        assert_eq!(
            lines[1],
            "rubric: function name=show_student_information required=true points=0 description=\"Required function: show_student_information()\""
        );
        assert!(lines[2].starts_with("rubric: code check=meaningful_vars points=5"));
    }

    #[test]
    fn clean_removes_only_report_folders() {
        let temp = tempdir().expect("tempdir");
        write_submission(temp.path(), "alice.py", "def main():\n    pass\n");
        let report_dir = temp.path().join("alice");
        fs::create_dir_all(&report_dir).expect("report dir");
        fs::write(report_dir.join(GRADE_TEXT_FILE), "Final Grade: 0/100\n").expect("grade");
        let unrelated = temp.path().join("data");
        fs::create_dir_all(&unrelated).expect("unrelated");
        fs::write(temp.path().join("grades.csv"), "submission\n").expect("ledger");

        clean(temp.path()).expect("clean");
        assert!(!report_dir.exists());
        assert!(unrelated.exists());
        assert!(!temp.path().join("grades.csv").exists());
        assert!(temp.path().join("alice.py").exists());
    }

    #[test]
    fn missing_directory_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let err = run_batch(&temp.path().join("nope"), None, None).expect_err("missing dir");
        assert!(err.to_string().contains("submissions directory not found"));
    }
}
