//! Per-submission report artifacts and the cumulative CSV ledger.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::rubric::{Grade, MAX_SCORE};
use crate::core::types::{ExecutionStatus, Transcript};

pub const OUTPUT_FILE: &str = "output.txt";
pub const GRADE_TEXT_FILE: &str = "grade.txt";
pub const GRADE_JSON_FILE: &str = "grade.json";

/// Machine-readable grade persisted to `grade.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub submission: String,
    pub status: ExecutionStatus,
    pub unconditional_loops: usize,
    pub moved_files: Vec<String>,
    #[serde(flatten)]
    pub grade: Grade,
}

/// One CSV ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub submission: String,
    pub kind: String,
    pub description: String,
    pub awarded: i64,
    pub possible: i64,
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub output_path: PathBuf,
    pub grade_text_path: PathBuf,
    pub grade_json_path: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            output_path: dir.join(OUTPUT_FILE),
            grade_text_path: dir.join(GRADE_TEXT_FILE),
            grade_json_path: dir.join(GRADE_JSON_FILE),
        }
    }
}

/// Render `grade.txt`: transcript, summary ledger, final score.
pub fn render_grade_text(transcript: &Transcript, grade: &Grade) -> String {
    let mut out = String::new();
    for line in transcript.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("\n\n--- GRADING SUMMARY ---\n");
    for entry in &grade.entries {
        out.push_str(&entry.note);
        out.push('\n');
    }
    if let Some(penalty) = &grade.penalty {
        out.push_str(&penalty.note());
        out.push('\n');
    }
    out.push_str(&format!("\nFinal Grade: {}/{MAX_SCORE}\n", grade.final_score));
    out
}

/// Write `output.txt`, `grade.txt` and `grade.json` into `dir`.
pub fn write_report(dir: &Path, transcript: &Transcript, report: &GradeReport) -> Result<ReportPaths> {
    let paths = ReportPaths::new(dir);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create report dir {}", paths.dir.display()))?;

    write_text(&paths.output_path, &transcript.lines().join("\n"))?;
    write_text(&paths.grade_text_path, &render_grade_text(transcript, &report.grade))?;
    let mut json = serde_json::to_string_pretty(report).context("serialize grade")?;
    json.push('\n');
    write_text(&paths.grade_json_path, &json)?;
    Ok(paths)
}

pub fn read_grade_report(path: &Path) -> Result<GradeReport> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// One row per rule plus a totals row.
pub fn ledger_rows(submission: &str, grade: &Grade) -> Vec<LedgerRow> {
    let mut rows: Vec<LedgerRow> = grade
        .entries
        .iter()
        .map(|entry| LedgerRow {
            submission: submission.to_string(),
            kind: entry.kind.to_string(),
            description: entry.description.clone(),
            awarded: i64::from(entry.awarded),
            possible: i64::from(entry.possible),
        })
        .collect();
    rows.push(LedgerRow {
        submission: submission.to_string(),
        kind: "total".to_string(),
        description: "Final Grade".to_string(),
        awarded: grade.final_score,
        possible: MAX_SCORE,
    });
    rows
}

/// Append rows to the CSV ledger, writing the header only into a new or empty file.
pub fn append_ledger(path: &Path, rows: &[LedgerRow]) -> Result<()> {
    let needs_header = fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
