//! Batch driver: grade every discovered submission in order.
//!
//! One submission's failure is logged and reported in its own folder; it never
//! stops the batch.

use std::path::Path;

use anyhow::{Context, Result};
use grader::io::extract::{Submission, discover_submissions};
use grader::pipeline::{BatchContext, grade_submission, write_degraded_report};
use tracing::{error, info, instrument};

/// Outcome of one submission within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub submission: String,
    pub score: i64,
    /// Execution status, or `error` when the pipeline itself failed.
    pub status: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub entries: Vec<BatchEntry>,
    pub failed: usize,
}

/// Grade all submissions, calling `on_entry` as each one finishes.
#[instrument(skip_all, fields(dir = %ctx.submissions_dir.display()))]
pub fn run(ctx: &BatchContext, mut on_entry: impl FnMut(&BatchEntry)) -> Result<BatchSummary> {
    let paths = discover_submissions(&ctx.submissions_dir, &ctx.cfg.exclude)
        .context("discover submissions")?;
    info!(submissions = paths.len(), "batch started");
    ctx.reset_ledger().context("reset ledger")?;

    let mut summary = BatchSummary::default();
    for path in paths {
        let entry = match grade_path(ctx, &path) {
            Ok(entry) => entry,
            Err(err) => {
                summary.failed += 1;
                handle_failure(ctx, &path, &err)
            }
        };
        on_entry(&entry);
        summary.entries.push(entry);
    }

    info!(
        submissions = summary.entries.len(),
        failed = summary.failed,
        "batch finished"
    );
    Ok(summary)
}

fn grade_path(ctx: &BatchContext, path: &Path) -> Result<BatchEntry> {
    let submission = Submission::load(path)?;
    let outcome = grade_submission(&submission, ctx)?;
    Ok(BatchEntry {
        submission: outcome.report.submission,
        score: outcome.report.grade.final_score,
        status: outcome.report.status.to_string(),
    })
}

fn handle_failure(ctx: &BatchContext, path: &Path, err: &anyhow::Error) -> BatchEntry {
    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    error!(submission = %id, err = %format!("{err:#}"), "grading failed");
    if let Err(report_err) = write_degraded_report(&ctx.output_dir(&id), err) {
        error!(submission = %id, err = %format!("{report_err:#}"), "degraded report failed");
    }
    BatchEntry {
        submission: id,
        score: 0,
        status: "error".to_string(),
    }
}
