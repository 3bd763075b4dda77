//! Test-only helpers for building facts, transcripts and submissions.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::core::types::{StaticFacts, Transcript};

/// Facts with the given defined functions and nothing else.
pub fn facts_with_functions(names: &[&str]) -> StaticFacts {
    StaticFacts {
        defined_functions: names.iter().map(|name| name.to_string()).collect(),
        ..StaticFacts::default()
    }
}

pub fn transcript(lines: &[&str]) -> Transcript {
    Transcript::from(lines.iter().map(|line| line.to_string()).collect::<Vec<_>>())
}

/// Whether a `python3` interpreter is available for execution tests.
pub fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether an interpreter test must be skipped; prints a notice when it does.
pub fn skip_without_python(test: &str) -> bool {
    if python_available() {
        return false;
    }
    eprintln!("skipping {test}: python3 not found on PATH");
    true
}

/// Write a submission file into `dir` and return its path.
pub fn write_submission(dir: &Path, file_name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, source).expect("write submission");
    path
}

/// A complete submission that exercises every rubric rule.
pub const COMPLETE_SUBMISSION: &str = r#"# Menu driven exercise
# Author: test

def main():
    # show the menu until the user exits
    choice = ""
    while choice != "9":
        print("1. Student info")
        print("2. Roman and binary")
        print("3. Population")
        choice = input("Enter an option: ")
        if choice == "1":
            show_student_information()
        elif choice == "2":
            show_roman_binary_number()
        elif choice == "3":
            show_population()


def show_student_information():
    print("Full Name: John Doe")
    print("Email: john@example.com")


def show_roman_binary_number():
    number = 0
    while number < 1 or number > 10:
        number = int(input("Enter a number (1-10): "))
    numerals = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"]
    print("Roman Numeral:", numerals[number - 1])
    print("Binary Value:", bin(number)[2:])


def show_population():
    organisms = 0
    while organisms < 2:
        organisms = float(input("Starting organisms: "))
    increase = -1.0
    while increase < 0:
        increase = float(input("Daily increase: "))
    days = 0
    while days < 1:
        days = int(input("Days: "))
    for day in range(1, days + 1):
        print("Day Approximate", day, organisms)
        organisms = organisms + organisms * increase / 100


if __name__ == "__main__":
    main()
"#;
