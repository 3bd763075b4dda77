use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grader::io::report::{GRADE_JSON_FILE, GradeReport, read_grade_report};

#[derive(Debug, Default)]
pub struct GradebookSummary {
    pub submissions: usize,
    pub zeroed: usize,
    pub avg_score: Option<f64>,
    pub statuses: BTreeMap<String, usize>,
    /// `kind: description` -> (passed, total).
    pub rule_pass_rates: BTreeMap<String, (usize, usize)>,
}

/// Subdirectories of `dir` holding a `grade.json`, sorted.
pub fn load_report_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path().join(GRADE_JSON_FILE);
        if entry.path().is_dir() && path.exists() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn aggregate(dir: &Path) -> Result<(GradebookSummary, Vec<String>)> {
    let mut summary = GradebookSummary::default();
    let mut warnings = Vec::new();
    let mut total_score = 0i64;

    for path in load_report_paths(dir)? {
        let report = match read_grade_report(&path) {
            Ok(report) => report,
            Err(err) => {
                warnings.push(format!("skip {}: grade.json invalid ({err:#})", path.display()));
                continue;
            }
        };

        summary.submissions += 1;
        total_score += report.grade.final_score;
        if report.grade.zeroed {
            summary.zeroed += 1;
        }
        *summary.statuses.entry(report.status.to_string()).or_insert(0) += 1;
        update_rule_pass_rates(&mut summary.rule_pass_rates, &report);
    }

    if summary.submissions > 0 {
        summary.avg_score = Some(total_score as f64 / summary.submissions as f64);
    }
    Ok((summary, warnings))
}

fn update_rule_pass_rates(stats: &mut BTreeMap<String, (usize, usize)>, report: &GradeReport) {
    for entry in &report.grade.entries {
        let label = format!("{}: {}", entry.kind, entry.description);
        let counts = stats.entry(label).or_insert((0, 0));
        if entry.passed {
            counts.0 += 1;
        }
        counts.1 += 1;
    }
}
