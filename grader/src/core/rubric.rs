//! Rubric rules and scoring.
//!
//! Rules are evaluated in order and independently; rule order is also report
//! order. The running score starts at a baseline, grows by each passing rule's
//! points, loses a fixed penalty per `while True:` loop, and is clamped to
//! `0..=100`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{StaticFacts, Transcript};

pub const MAX_SCORE: i64 = 100;

/// One scoring rule (TOML: `[[rubric]]` with a `type` tag).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// A routine with this name must be defined.
    Function {
        name: String,
        #[serde(default)]
        points: u32,
        /// Absence zeroes the whole grade.
        #[serde(default)]
        required: bool,
        description: String,
    },
    /// A structural check against the static facts.
    Code {
        check: CodeCheck,
        points: u32,
        description: String,
    },
    /// A literal phrase that must appear in some transcript line.
    Output {
        phrase: String,
        points: u32,
        description: String,
    },
}

/// Structural checks available to `code` rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeCheck {
    /// Every assigned name is longer than two characters and lower-case.
    MeaningfulVars,
    /// At least three comment lines.
    Comments,
    /// A loop inside the roman/binary routine.
    LoopValidationRoman,
    /// At least three condition-tested loops inside the population routine.
    PopulationInputValidation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Function,
    Code,
    Output,
}

impl fmt::Display for CodeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodeCheck::MeaningfulVars => "meaningful_vars",
            CodeCheck::Comments => "comments",
            CodeCheck::LoopValidationRoman => "loop_validation_roman",
            CodeCheck::PopulationInputValidation => "population_input_validation",
        })
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleKind::Function => "function",
            RuleKind::Code => "code",
            RuleKind::Output => "output",
        })
    }
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Function { .. } => RuleKind::Function,
            Rule::Code { .. } => RuleKind::Code,
            Rule::Output { .. } => RuleKind::Output,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Rule::Function { points, .. }
            | Rule::Code { points, .. }
            | Rule::Output { points, .. } => *points,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Rule::Function { description, .. }
            | Rule::Code { description, .. }
            | Rule::Output { description, .. } => description,
        }
    }
}

impl CodeCheck {
    pub fn passes(self, facts: &StaticFacts) -> bool {
        match self {
            CodeCheck::MeaningfulVars => facts.assigned_names.iter().all(|name| {
                name.chars().count() > 2 && is_lower(name)
            }),
            CodeCheck::Comments => facts.comment_lines >= 3,
            CodeCheck::LoopValidationRoman => facts.roman_loop,
            CodeCheck::PopulationInputValidation => facts.population_loops >= 3,
        }
    }
}

/// At least one cased character and no upper-case ones.
fn is_lower(name: &str) -> bool {
    name.chars().any(char::is_lowercase) && !name.chars().any(char::is_uppercase)
}

/// The rubric shipped with the exercise.
pub fn default_rubric() -> Vec<Rule> {
    fn output(phrase: &str, points: u32, description: &str) -> Rule {
        Rule::Output {
            phrase: phrase.to_string(),
            points,
            description: description.to_string(),
        }
    }
    fn function(name: &str, points: u32, required: bool, description: &str) -> Rule {
        Rule::Function {
            name: name.to_string(),
            points,
            required,
            description: description.to_string(),
        }
    }
    fn code(check: CodeCheck, points: u32, description: &str) -> Rule {
        Rule::Code {
            check,
            points,
            description: description.to_string(),
        }
    }

    vec![
        output(
            "Full Name:",
            5,
            "Student info displayed via show_student_information()",
        ),
        function(
            "show_student_information",
            0,
            true,
            "Required function: show_student_information()",
        ),
        code(CodeCheck::MeaningfulVars, 5, "Used meaningful variable names"),
        code(CodeCheck::Comments, 10, "Clear and detailed comments in code"),
        function("main", 10, false, "Implemented and displayed menu in main()"),
        function(
            "show_roman_binary_number",
            5,
            false,
            "Function: show_roman_binary_number() implemented",
        ),
        code(
            CodeCheck::LoopValidationRoman,
            5,
            "Used loop to validate input in roman function",
        ),
        output("Binary Value", 5, "Correct Roman Numeral and Binary output"),
        function(
            "show_population",
            5,
            false,
            "Function: show_population() implemented",
        ),
        code(
            CodeCheck::PopulationInputValidation,
            30,
            "Correct 3 input validations in population function",
        ),
        output(
            "Day Approximate",
            10,
            "Correct population growth calculation",
        ),
        output(
            "Enter an option:",
            10,
            "Looped back to main menu after valid options",
        ),
    ]
}

/// Baseline and penalty applied around the rule outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub baseline: i64,
    pub unconditional_loop_penalty: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            baseline: MAX_SCORE,
            unconditional_loop_penalty: 10,
        }
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: RuleKind,
    pub description: String,
    pub awarded: u32,
    pub possible: u32,
    pub passed: bool,
    /// Human-readable ledger line for `grade.txt`.
    pub note: String,
}

/// Deduction for `while True:` loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPenalty {
    pub loops: usize,
    pub points: i64,
}

impl LoopPenalty {
    pub fn note(&self) -> String {
        format!(
            "-{} for {} use(s) of 'while True:'",
            self.points, self.loops
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub entries: Vec<LedgerEntry>,
    pub penalty: Option<LoopPenalty>,
    /// A required function was missing.
    pub zeroed: bool,
    pub final_score: i64,
}

/// Evaluate every rule in order and compute the clamped final score.
pub fn evaluate(
    rules: &[Rule],
    facts: &StaticFacts,
    transcript: &Transcript,
    policy: ScoringPolicy,
) -> Grade {
    let mut running = policy.baseline;
    let mut zeroed = false;
    let mut entries = Vec::with_capacity(rules.len());

    for rule in rules {
        let passed = match rule {
            Rule::Function { name, .. } => facts.defined_functions.contains(name),
            Rule::Code { check, .. } => check.passes(facts),
            Rule::Output { phrase, .. } => transcript.contains_phrase(phrase),
        };

        let possible = rule.points();
        let note = match rule {
            _ if passed => format!("+{possible} for {}", rule.description()),
            Rule::Function {
                name,
                required: true,
                ..
            } => {
                zeroed = true;
                format!("Missing required function: {name}")
            }
            _ => format!("-{possible} for missing: {}", rule.description()),
        };

        let awarded = if passed { possible } else { 0 };
        running += i64::from(awarded);
        entries.push(LedgerEntry {
            kind: rule.kind(),
            description: rule.description().to_string(),
            awarded,
            possible,
            passed,
            note,
        });
    }

    let penalty = (facts.unconditional_loops > 0).then(|| LoopPenalty {
        loops: facts.unconditional_loops,
        points: i64::try_from(facts.unconditional_loops)
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(policy.unconditional_loop_penalty)),
    });
    if let Some(penalty) = &penalty {
        running = running.saturating_sub(penalty.points);
    }

    let final_score = if zeroed {
        0
    } else {
        running.clamp(0, MAX_SCORE)
    };

    Grade {
        entries,
        penalty,
        zeroed,
        final_score,
    }
}
