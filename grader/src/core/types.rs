//! Shared deterministic types for the grading core.
//!
//! These types define stable contracts between pipeline stages. They must not
//! depend on external state or I/O.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four routines every submission is expected to define.
///
/// Variant order is the fixed reconstruction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Routine {
    Main,
    StudentInfo,
    RomanBinary,
    Population,
}

impl Routine {
    pub const ALL: [Routine; 4] = [
        Routine::Main,
        Routine::StudentInfo,
        Routine::RomanBinary,
        Routine::Population,
    ];

    /// Canonical definition name looked up in submissions.
    pub fn function_name(self) -> &'static str {
        match self {
            Routine::Main => "main",
            Routine::StudentInfo => "show_student_information",
            Routine::RomanBinary => "show_roman_binary_number",
            Routine::Population => "show_population",
        }
    }

    /// Keyword used when a definition name is close to, but not exactly, canonical.
    pub fn keyword(self) -> &'static str {
        match self {
            Routine::Main => "main",
            Routine::StudentInfo => "student",
            Routine::RomanBinary => "binary",
            Routine::Population => "population",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a parsed definition name onto a routine.
    ///
    /// Exact canonical names win; otherwise the first keyword contained in the
    /// name, in [`Routine::ALL`] order.
    pub fn from_definition_name(name: &str) -> Option<Routine> {
        Routine::ALL
            .into_iter()
            .find(|routine| routine.function_name() == name)
            .or_else(|| {
                Routine::ALL
                    .into_iter()
                    .find(|routine| name.contains(routine.keyword()))
            })
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// The extracted routine sources for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    slots: [Option<String>; 4],
    /// Set when the submission did not parse; every slot is then empty.
    pub parse_error: Option<String>,
}

impl Fragments {
    pub fn unparsed(error: impl Into<String>) -> Self {
        Self {
            slots: Default::default(),
            parse_error: Some(error.into()),
        }
    }

    pub fn get(&self, routine: Routine) -> Option<&str> {
        self.slots[routine.index()].as_deref()
    }

    pub fn set(&mut self, routine: Routine, fragment: Option<String>) {
        self.slots[routine.index()] = fragment;
    }

    /// Fragments in reconstruction order, absent ones included.
    pub fn iter(&self) -> impl Iterator<Item = (Routine, Option<&str>)> + '_ {
        Routine::ALL
            .into_iter()
            .map(|routine| (routine, self.get(routine)))
    }

    pub fn found(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Structural facts computed once from the reconstructed unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticFacts {
    pub defined_functions: BTreeSet<String>,
    pub assigned_names: BTreeSet<String>,
    pub comment_lines: usize,
    /// Any `for`/`while` inside the roman/binary routine.
    pub roman_loop: bool,
    /// Condition-tested loops inside the population routine.
    pub population_loops: usize,
    /// `while True:` loops anywhere in the unit.
    pub unconditional_loops: usize,
}

/// How the interpreter run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Ran to completion, possibly with recorded runtime errors.
    Completed,
    /// The reconstructed unit did not compile.
    CompileFailed,
    /// Killed after exceeding the wall-clock limit.
    TimedOut,
    /// The interpreter itself exited abnormally.
    Crashed { exit_code: Option<i32> },
    /// The interpreter could not be started.
    LaunchFailed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Completed => f.write_str("completed"),
            ExecutionStatus::CompileFailed => f.write_str("compile_failed"),
            ExecutionStatus::TimedOut => f.write_str("timed_out"),
            ExecutionStatus::Crashed {
                exit_code: Some(code),
            } => write!(f, "crashed({code})"),
            ExecutionStatus::Crashed { exit_code: None } => f.write_str("crashed"),
            ExecutionStatus::LaunchFailed => f.write_str("launch_failed"),
        }
    }
}

/// Chronological lines of program output, echoed prompts, supplied answers
/// and harness diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append raw output, one entry per line.
    pub fn extend_text(&mut self, text: &str) {
        self.lines.extend(text.lines().map(str::to_string));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains_phrase(&self, phrase: &str) -> bool {
        self.lines.iter().any(|line| line.contains(phrase))
    }
}

impl From<Vec<String>> for Transcript {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_win_over_keywords() {
        assert_eq!(
            Routine::from_definition_name("show_student_information"),
            Some(Routine::StudentInfo)
        );
        assert_eq!(
            Routine::from_definition_name("show_roman_binary_number"),
            Some(Routine::RomanBinary)
        );
    }

    #[test]
    fn keyword_fallback_uses_priority_order() {
        assert_eq!(
            Routine::from_definition_name("main_student_menu"),
            Some(Routine::Main)
        );
        assert_eq!(
            Routine::from_definition_name("binary_population"),
            Some(Routine::RomanBinary)
        );
        assert_eq!(Routine::from_definition_name("helper"), None);
    }

    #[test]
    fn keyword_match_is_case_sensitive() {
        assert_eq!(Routine::from_definition_name("ShowPopulation"), None);
    }

    #[test]
    fn transcript_splits_text_into_lines() {
        let mut transcript = Transcript::new();
        transcript.extend_text("one\ntwo\n");
        transcript.push("three");
        assert_eq!(transcript.lines(), ["one", "two", "three"]);
        assert!(transcript.contains_phrase("hre"));
        assert!(!transcript.contains_phrase("four"));
    }

    #[test]
    fn status_display_is_stable() {
        assert_eq!(ExecutionStatus::TimedOut.to_string(), "timed_out");
        assert_eq!(
            ExecutionStatus::Crashed { exit_code: Some(1) }.to_string(),
            "crashed(1)"
        );
    }
}
