//! Reassemble extracted fragments into one program unit.
//!
//! Every fragment line is bucketed into the routine whose definition most
//! recently started. Routine starts come from the fragment's parsed top-level
//! definitions, so nested helpers such as `def validate_binary()` and
//! definition-like lines inside string literals stay where they are.

use std::collections::BTreeMap;

use rustpython_parser::Parse;
use rustpython_parser::ast::{self, Ranged};
use tracing::warn;

use crate::core::types::{Fragments, Routine};

const SEPARATOR: &str = "\n\n\n";

/// Classification of a single fragment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    RoutineStart(Routine),
    Body,
}

/// Classify every line of `fragment` using its parsed top-level definitions.
///
/// A fragment that does not parse has no routine starts.
pub fn classify_lines(fragment: &str) -> Vec<(LineKind, &str)> {
    let starts = routine_starts(fragment);
    fragment
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let kind = starts
                .get(&index)
                .map_or(LineKind::Body, |routine| LineKind::RoutineStart(*routine));
            (kind, line)
        })
        .collect()
}

/// Line index of each recognized top-level `def` keyword.
fn routine_starts(fragment: &str) -> BTreeMap<usize, Routine> {
    let suite = match ast::Suite::parse(fragment, "<fragment>") {
        Ok(suite) => suite,
        Err(err) => {
            warn!(err = %err, "fragment did not parse");
            return BTreeMap::new();
        }
    };

    suite
        .iter()
        .filter_map(|stmt| {
            let name = match stmt {
                ast::Stmt::FunctionDef(def) => def.name.as_str(),
                ast::Stmt::AsyncFunctionDef(def) => def.name.as_str(),
                _ => return None,
            };
            let routine = Routine::from_definition_name(name)?;
            let offset = usize::from(stmt.range().start()).min(fragment.len());
            let line = fragment[..offset].matches('\n').count();
            Some((line, routine))
        })
        .collect()
}

/// Build the reconstructed unit from (possibly partial) fragments.
///
/// Lines seen before any routine start are dropped. Buffers are emitted in
/// [`Routine::ALL`] order, empty ones skipped.
pub fn reconstruct(fragments: &Fragments) -> String {
    let mut buffers: [Vec<&str>; 4] = Default::default();
    let mut current: Option<Routine> = None;

    for (_, fragment) in fragments.iter() {
        let Some(fragment) = fragment else {
            continue;
        };
        for (kind, line) in classify_lines(fragment) {
            if let LineKind::RoutineStart(routine) = kind {
                current = Some(routine);
            }
            if let Some(routine) = current {
                buffers[routine.index()].push(line);
            }
        }
    }

    let mut unit = buffers
        .iter()
        .filter(|lines| !lines.is_empty())
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    if !unit.is_empty() {
        unit.push('\n');
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragment::extract_fragments;

    fn fragments(entries: &[(Routine, &str)]) -> Fragments {
        let mut fragments = Fragments::default();
        for (routine, text) in entries {
            fragments.set(*routine, Some((*text).to_string()));
        }
        fragments
    }

    fn kinds(fragment: &str) -> Vec<LineKind> {
        classify_lines(fragment)
            .into_iter()
            .map(|(kind, _)| kind)
            .collect()
    }

    #[test]
    fn classifies_definition_lines_by_parsed_name() {
        assert_eq!(
            kinds("def show_population():\n    pass"),
            [LineKind::RoutineStart(Routine::Population), LineKind::Body]
        );
        assert_eq!(
            kinds("async def main():\n    pass"),
            [LineKind::RoutineStart(Routine::Main), LineKind::Body]
        );
        assert_eq!(
            kinds("@decorator\ndef main():\n    def main():\n        pass"),
            [
                LineKind::Body,
                LineKind::RoutineStart(Routine::Main),
                LineKind::Body,
                LineKind::Body,
            ]
        );
        assert_eq!(kinds("def helper():\n    pass"), [LineKind::Body, LineKind::Body]);
        assert_eq!(kinds("def broken(:"), [LineKind::Body]);
    }

    #[test]
    fn definition_text_inside_string_stays_in_its_routine() {
        let source = "def show_population():\n    text = \"\"\"\ndef main_menu():\n    pass\n\"\"\"\n    print(text)\n";
        let unit = reconstruct(&extract_fragments(source, "erin.py"));
        assert_eq!(unit, source);
        assert!(ast::Suite::parse(&unit, "<unit>").is_ok());
    }

    #[test]
    fn body_keywords_do_not_switch_buckets() {
        let input = fragments(&[(
            Routine::Population,
            "def show_population():\n    print(\"binary main student\")\n    def validate_binary():\n        pass",
        )]);
        let unit = reconstruct(&input);
        assert_eq!(
            unit,
            "def show_population():\n    print(\"binary main student\")\n    def validate_binary():\n        pass\n"
        );
    }

    #[test]
    fn emits_routines_in_fixed_order() {
        let input = fragments(&[
            (Routine::Population, "def show_population():\n    pass"),
            (Routine::Main, "def main():\n    pass"),
        ]);
        assert_eq!(
            reconstruct(&input),
            "def main():\n    pass\n\n\ndef show_population():\n    pass\n"
        );
    }

    #[test]
    fn drops_lines_before_first_routine() {
        let input = fragments(&[(Routine::Main, "@decorator\ndef main():\n    pass")]);
        assert_eq!(reconstruct(&input), "def main():\n    pass\n");
    }

    #[test]
    fn empty_fragments_reconstruct_to_empty_unit() {
        assert_eq!(reconstruct(&Fragments::default()), "");
        assert_eq!(reconstruct(&Fragments::unparsed("bad")), "");
    }

    #[test]
    fn reconstruction_is_deterministic() {
        let input = fragments(&[
            (Routine::Main, "def main():\n    show_student_information()"),
            (
                Routine::StudentInfo,
                "def show_student_information():\n    print('Full Name: x')",
            ),
        ]);
        assert_eq!(reconstruct(&input), reconstruct(&input));
    }
}
