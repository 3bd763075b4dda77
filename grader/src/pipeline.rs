//! Grade one submission end to end.
//!
//! Coordinates extraction, reconstruction, analysis, execution, rubric
//! evaluation and report writing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::analysis::analyze;
use crate::core::reconstruct::reconstruct;
use crate::core::rubric::{MAX_SCORE, evaluate};
use crate::core::types::Transcript;
use crate::io::answers::load_answers;
use crate::io::config::GraderConfig;
use crate::io::extract::Submission;
use crate::io::report::{
    GRADE_TEXT_FILE, GradeReport, OUTPUT_FILE, ReportPaths, append_ledger, ledger_rows,
    write_report,
};
use crate::io::sandbox::Sandbox;

/// State shared by every submission in one batch.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub cfg: GraderConfig,
    pub sandbox: Sandbox,
    /// Read once; every submission replays from the first answer.
    pub answers: Vec<String>,
    pub submissions_dir: PathBuf,
    pub ledger_path: PathBuf,
}

impl BatchContext {
    pub fn new(cfg: GraderConfig, submissions_dir: &Path) -> Result<Self> {
        let answers = load_answers(&submissions_dir.join(&cfg.answers_file))?;
        let sandbox = Sandbox::from_config(&cfg, submissions_dir);
        let ledger_path = submissions_dir.join(&cfg.ledger_file);
        Ok(Self {
            cfg,
            sandbox,
            answers,
            submissions_dir: submissions_dir.to_path_buf(),
            ledger_path,
        })
    }

    /// Folder holding one submission's report and moved files.
    pub fn output_dir(&self, submission_id: &str) -> PathBuf {
        self.submissions_dir.join(submission_id)
    }

    /// Remove the ledger so the batch starts from an empty file.
    pub fn reset_ledger(&self) -> Result<()> {
        if self.ledger_path.exists() {
            fs::remove_file(&self.ledger_path)
                .with_context(|| format!("remove {}", self.ledger_path.display()))?;
        }
        Ok(())
    }
}

/// Result of grading a single submission.
#[derive(Debug)]
pub struct GradeOutcome {
    pub report: GradeReport,
    pub paths: ReportPaths,
}

#[instrument(skip_all, fields(submission = %submission.id))]
pub fn grade_submission(submission: &Submission, ctx: &BatchContext) -> Result<GradeOutcome> {
    info!("grading started");
    let output_dir = ctx.output_dir(&submission.id);

    let fragments = submission.fragments();
    let unit = reconstruct(&fragments);
    debug!(bytes = unit.len(), "unit reconstructed");
    let facts = analyze(&unit);
    debug!(
        functions = facts.defined_functions.len(),
        unconditional_loops = facts.unconditional_loops,
        "static facts collected"
    );

    let execution = ctx.sandbox.execute(&unit, &ctx.answers, &output_dir);

    let mut transcript = Transcript::new();
    if let Some(err) = &fragments.parse_error {
        transcript.push(format!("Parse error: {err}"));
    }
    for line in execution.transcript.lines() {
        transcript.push(line.clone());
    }

    let grade = evaluate(
        &ctx.cfg.rubric,
        &facts,
        &transcript,
        ctx.cfg.scoring_policy(),
    );
    let report = GradeReport {
        submission: submission.id.clone(),
        status: execution.status,
        unconditional_loops: facts.unconditional_loops,
        moved_files: execution.moved_files,
        grade,
    };

    let paths = write_report(&output_dir, &transcript, &report).context("write report")?;
    append_ledger(&ctx.ledger_path, &ledger_rows(&report.submission, &report.grade))
        .context("append ledger")?;

    info!(
        score = report.grade.final_score,
        status = %report.status,
        elapsed_ms = execution.elapsed.as_millis() as u64,
        "grading finished"
    );
    Ok(GradeOutcome { report, paths })
}

/// Write a minimal report describing a pipeline failure.
pub fn write_degraded_report(output_dir: &Path, err: &anyhow::Error) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create report dir {}", output_dir.display()))?;
    let diagnostic = format!("Grading error: {err:#}");
    fs::write(output_dir.join(OUTPUT_FILE), &diagnostic)
        .with_context(|| format!("write {}", output_dir.join(OUTPUT_FILE).display()))?;
    let summary = format!("{diagnostic}\n\n\n--- GRADING SUMMARY ---\n\nFinal Grade: 0/{MAX_SCORE}\n");
    fs::write(output_dir.join(GRADE_TEXT_FILE), summary)
        .with_context(|| format!("write {}", output_dir.join(GRADE_TEXT_FILE).display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExecutionStatus;
    use crate::test_support::write_submission;

    fn offline_context(dir: &Path) -> BatchContext {
        let cfg = GraderConfig {
            interpreter: vec!["definitely-not-a-python-interpreter".to_string()],
            settle_millis: 0,
            ..GraderConfig::default()
        };
        BatchContext::new(cfg, dir).expect("context")
    }

    #[test]
    fn unparsable_submission_still_gets_a_zero_report() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_submission(temp.path(), "carol.py", "def main(:\n    pass\n");
        let submission = Submission::load(&path).expect("load");
        let ctx = offline_context(temp.path());

        let outcome = grade_submission(&submission, &ctx).expect("grade");
        assert_eq!(outcome.report.grade.final_score, 0);
        assert!(outcome.report.grade.zeroed);
        assert_eq!(outcome.report.status, ExecutionStatus::LaunchFailed);

        let output = fs::read_to_string(&outcome.paths.output_path).expect("output");
        assert!(output.starts_with("Parse error:"));
        let grade = fs::read_to_string(&outcome.paths.grade_text_path).expect("grade");
        assert!(grade.contains("Missing required function: show_student_information"));
        assert!(grade.contains("-10 for missing: Implemented and displayed menu in main()"));
        assert!(!grade.contains("Missing required function: main"));
        assert!(grade.ends_with("Final Grade: 0/100\n"));
        assert!(ctx.ledger_path.exists());
    }

    #[test]
    fn reset_ledger_removes_previous_rows() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = offline_context(temp.path());
        fs::write(&ctx.ledger_path, "stale").expect("ledger");
        ctx.reset_ledger().expect("reset");
        assert!(!ctx.ledger_path.exists());
        ctx.reset_ledger().expect("reset missing");
    }

    #[test]
    fn degraded_report_records_the_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("dave");
        let err = anyhow::anyhow!("disk full").context("write report");
        write_degraded_report(&dir, &err).expect("degraded");
        let grade = fs::read_to_string(dir.join(GRADE_TEXT_FILE)).expect("grade");
        assert!(grade.starts_with("Grading error: write report: disk full"));
        assert!(grade.ends_with("Final Grade: 0/100\n"));
    }
}
