//! Grader configuration stored in `grader.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::rubric::{Rule, ScoringPolicy, default_rubric};

pub const CONFIG_FILE: &str = "grader.toml";

/// Grader configuration (TOML).
///
/// Missing fields default to the values the exercise was designed around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraderConfig {
    /// Newline-separated scripted answers, relative to the submissions directory.
    pub answers_file: String,

    /// Wall-clock budget for one submission's execution.
    pub timeout_secs: u64,

    /// Delay before scanning for side-effect files after execution ends.
    pub settle_millis: u64,

    /// Discard interpreter output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Answer supplied once the scripted answers run out (the menu's exit choice).
    pub exhausted_answer: String,

    /// Starting score before rule outcomes are added.
    pub baseline: i64,

    /// Points removed per `while True:` loop.
    pub unconditional_loop_penalty: u32,

    /// Extension (without dot) of side-effect files relocated after a run.
    pub side_effect_extension: String,

    /// Interpreter argv prefix (e.g. `["python3"]`).
    pub interpreter: Vec<String>,

    /// Submission file names to skip.
    pub exclude: Vec<String>,

    /// Cumulative CSV ledger, relative to the submissions directory.
    pub ledger_file: String,

    pub rubric: Vec<Rule>,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            answers_file: "input.txt".to_string(),
            timeout_secs: 10,
            settle_millis: 1_000,
            output_limit_bytes: 1_000_000,
            exhausted_answer: "9".to_string(),
            baseline: 100,
            unconditional_loop_penalty: 10,
            side_effect_extension: "txt".to_string(),
            interpreter: vec!["python3".to_string()],
            exclude: vec!["grader.py".to_string()],
            ledger_file: "grades.csv".to_string(),
            rubric: default_rubric(),
        }
    }
}

impl GraderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.answers_file.trim().is_empty() {
            return Err(anyhow!("answers_file must be non-empty"));
        }
        if self.ledger_file.trim().is_empty() {
            return Err(anyhow!("ledger_file must be non-empty"));
        }
        if self.side_effect_extension.is_empty() || self.side_effect_extension.contains('.') {
            return Err(anyhow!(
                "side_effect_extension must be a bare extension such as \"txt\""
            ));
        }
        if self.interpreter.is_empty() || self.interpreter[0].trim().is_empty() {
            return Err(anyhow!("interpreter must be a non-empty array"));
        }
        if self.rubric.is_empty() {
            return Err(anyhow!("rubric must be a non-empty array"));
        }
        for (index, rule) in self.rubric.iter().enumerate() {
            validate_rule(rule).with_context(|| format!("rubric[{index}] invalid"))?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            baseline: self.baseline,
            unconditional_loop_penalty: self.unconditional_loop_penalty,
        }
    }
}

fn validate_rule(rule: &Rule) -> Result<()> {
    if rule.description().trim().is_empty() {
        return Err(anyhow!("description must be non-empty"));
    }
    match rule {
        Rule::Function { name, .. } if name.trim().is_empty() => {
            Err(anyhow!("function.name must be non-empty"))
        }
        Rule::Output { phrase, .. } if phrase.is_empty() => {
            Err(anyhow!("output.phrase must be non-empty"))
        }
        _ => Ok(()),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GraderConfig::default()`.
pub fn load_config(path: &Path) -> Result<GraderConfig> {
    if !path.exists() {
        let cfg = GraderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GraderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
