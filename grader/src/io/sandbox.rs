//! Execute a reconstructed unit in a fresh interpreter process.
//!
//! The unit and its scripted answers travel to an embedded bootstrap on stdin.
//! The bootstrap binds `input` to the answer source in the unit's own globals,
//! so prompts, answers and program output arrive on stdout in the order they
//! happened. The process is killed once the deadline passes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::types::{ExecutionStatus, Transcript};
use crate::io::config::GraderConfig;
use crate::io::process::{ProcessLimits, run_with_deadline};
use crate::io::side_effects::SideEffectCapture;

const BOOTSTRAP: &str = include_str!("bootstrap.py");

/// Exit code the bootstrap uses when the unit does not compile.
const COMPILE_FAILED_EXIT: i32 = 3;

#[derive(Serialize)]
struct Payload<'a> {
    source: &'a str,
    answers: &'a [String],
    exhausted_answer: &'a str,
}

/// Everything observed while running one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub transcript: Transcript,
    pub status: ExecutionStatus,
    /// Side-effect files moved into the submission folder.
    pub moved_files: Vec<String>,
    pub elapsed: Duration,
}

/// Interpreter settings shared by every submission in a batch.
#[derive(Debug, Clone)]
pub struct Sandbox {
    pub interpreter: Vec<String>,
    /// Working directory of the child; also where side effects are looked for.
    pub work_dir: PathBuf,
    pub limits: ProcessLimits,
    pub exhausted_answer: String,
    pub capture: SideEffectCapture,
}

impl Sandbox {
    pub fn from_config(cfg: &GraderConfig, work_dir: &Path) -> Self {
        Self {
            interpreter: cfg.interpreter.clone(),
            work_dir: work_dir.to_path_buf(),
            limits: ProcessLimits {
                timeout: cfg.timeout(),
                output_limit_bytes: cfg.output_limit_bytes,
            },
            exhausted_answer: cfg.exhausted_answer.clone(),
            capture: SideEffectCapture {
                extension: cfg.side_effect_extension.clone(),
                exclude: BTreeSet::from([cfg.answers_file.clone()]),
                settle: cfg.settle(),
            },
        }
    }

    /// Run `unit`, replaying `answers`, and move new side-effect files into `output_dir`.
    ///
    /// Never fails: every problem becomes a transcript diagnostic.
    #[instrument(skip_all, fields(output_dir = %output_dir.display(), answers = answers.len()))]
    pub fn execute(&self, unit: &str, answers: &[String], output_dir: &Path) -> Execution {
        let snapshot = match self.capture.snapshot(&self.work_dir) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(err = %err, "side-effect snapshot failed");
                None
            }
        };

        let mut execution = self.run_interpreter(unit, answers);

        match snapshot {
            Some(before) => {
                let relocation = self
                    .capture
                    .relocate_new(&self.work_dir, &before, output_dir);
                for error in relocation.errors {
                    execution.transcript.push(error);
                }
                execution.moved_files = relocation.moved;
            }
            None => execution
                .transcript
                .push("File handling error: could not snapshot working directory"),
        }

        debug!(status = %execution.status, lines = execution.transcript.lines().len(), "execution finished");
        execution
    }

    fn command(&self, unit: &str, answers: &[String]) -> Result<(Command, Vec<u8>)> {
        let payload = serde_json::to_vec(&Payload {
            source: unit,
            answers,
            exhausted_answer: &self.exhausted_answer,
        })
        .context("serialize sandbox payload")?;

        let (program, args) = self
            .interpreter
            .split_first()
            .ok_or_else(|| anyhow!("interpreter must be a non-empty array"))?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg("-u")
            .arg("-c")
            .arg(BOOTSTRAP)
            .current_dir(&self.work_dir)
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONDONTWRITEBYTECODE", "1");
        Ok((cmd, payload))
    }

    fn run_interpreter(&self, unit: &str, answers: &[String]) -> Execution {
        let mut transcript = Transcript::new();
        let output = match self
            .command(unit, answers)
            .and_then(|(cmd, payload)| run_with_deadline(cmd, &payload, self.limits))
        {
            Ok(output) => output,
            Err(err) => {
                warn!(err = %err, "interpreter launch failed");
                transcript.push(format!(
                    "Execution error: failed to launch interpreter: {err:#}"
                ));
                return Execution {
                    transcript,
                    status: ExecutionStatus::LaunchFailed,
                    moved_files: Vec::new(),
                    elapsed: Duration::ZERO,
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        transcript.extend_text(&stdout);
        if output.stdout_truncated > 0 {
            transcript.push(format!(
                "[output truncated {} bytes]",
                output.stdout_truncated
            ));
        }

        let status = if output.timed_out {
            transcript.push(format!(
                "Program execution timed out after {} seconds",
                self.limits.timeout.as_secs()
            ));
            ExecutionStatus::TimedOut
        } else {
            match output.status.code() {
                Some(0) => ExecutionStatus::Completed,
                Some(COMPILE_FAILED_EXIT) => ExecutionStatus::CompileFailed,
                code => {
                    transcript.push(format!(
                        "Execution error: interpreter exited with status {}",
                        code.map_or_else(|| "signal".to_string(), |code| code.to_string())
                    ));
                    transcript.extend_text(&stderr);
                    ExecutionStatus::Crashed { exit_code: code }
                }
            }
        };
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "interpreter stderr");
        }

        Execution {
            transcript,
            status,
            moved_files: Vec::new(),
            elapsed: output.elapsed,
        }
    }
}
