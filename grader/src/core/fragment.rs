//! Locate the exercise routines in submission source.
//!
//! Only top-level definitions count. A fragment is the definition's own
//! source span (decorators included), with every line right-trimmed so that
//! repeated extraction is byte-stable.

use rustpython_parser::ast::{self, Ranged};
use rustpython_parser::Parse;

use crate::core::types::{Fragments, Routine};

/// Parse `source` and extract all four routines.
///
/// A parse failure yields empty fragments carrying the parser diagnostic.
pub fn extract_fragments(source: &str, source_path: &str) -> Fragments {
    let suite = match ast::Suite::parse(source, source_path) {
        Ok(suite) => suite,
        Err(err) => return Fragments::unparsed(err.to_string()),
    };

    let mut fragments = Fragments::default();
    for routine in Routine::ALL {
        fragments.set(
            routine,
            extract_function(source, &suite, routine.function_name()),
        );
    }
    fragments
}

/// Source of the top-level function named `name`, if any.
pub fn extract_function(source: &str, suite: &[ast::Stmt], name: &str) -> Option<String> {
    suite.iter().find_map(|stmt| {
        let (def_name, range, decorators) = match stmt {
            ast::Stmt::FunctionDef(def) => (def.name.as_str(), def.range, &def.decorator_list),
            ast::Stmt::AsyncFunctionDef(def) => {
                (def.name.as_str(), def.range, &def.decorator_list)
            }
            _ => return None,
        };
        if def_name != name {
            return None;
        }

        let start = decorators
            .iter()
            .map(|decorator| usize::from(decorator.range().start()))
            .chain(std::iter::once(usize::from(range.start())))
            .min()
            .unwrap_or_default();
        let start = line_start(source, start);
        let end = usize::from(range.end()).min(source.len());
        Some(canonicalize(&source[start..end]))
    })
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |newline| newline + 1)
}

fn canonicalize(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION: &str = r#"import math

def helper():
    return 1

@staticmethod
def main():
    # menu loop
    choice = input("Enter an option: ")
    print(choice)

def show_population():
    days = 3
    print(days)

if __name__ == "__main__":
    main()
"#;

    #[test]
    fn extracts_named_top_level_functions() {
        let fragments = extract_fragments(SUBMISSION, "<test>");
        assert!(fragments.parse_error.is_none());
        assert_eq!(fragments.found(), 2);
        assert_eq!(
            fragments.get(Routine::Main),
            Some(
                "@staticmethod\ndef main():\n    # menu loop\n    choice = input(\"Enter an option: \")\n    print(choice)"
            )
        );
        assert_eq!(
            fragments.get(Routine::Population),
            Some("def show_population():\n    days = 3\n    print(days)")
        );
        assert_eq!(fragments.get(Routine::StudentInfo), None);
    }

    #[test]
    fn nested_definitions_are_not_extracted() {
        let source = "def outer():\n    def main():\n        pass\n    main()\n";
        let fragments = extract_fragments(source, "<test>");
        assert_eq!(fragments.get(Routine::Main), None);
    }

    #[test]
    fn async_definitions_are_extracted() {
        let source = "async def show_population():\n    pass\n";
        let fragments = extract_fragments(source, "<test>");
        assert_eq!(
            fragments.get(Routine::Population),
            Some("async def show_population():\n    pass")
        );
    }

    #[test]
    fn parse_failure_yields_no_fragments() {
        let fragments = extract_fragments("def main(:\n    pass\n", "<test>");
        assert!(fragments.parse_error.is_some());
        assert_eq!(fragments.found(), 0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract_fragments(SUBMISSION, "<test>");
        let second = extract_fragments(SUBMISSION, "<test>");
        assert_eq!(first, second);
    }
}
