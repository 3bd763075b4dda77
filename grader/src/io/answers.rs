//! Scripted answers replayed in place of interactive input.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

/// Load newline-separated answers, trimming each line.
///
/// A missing file yields no answers: every prompt then receives the
/// exhausted-answer sentinel.
pub fn load_answers(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        warn!(path = %path.display(), "answers file missing; every prompt gets the exit answer");
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_answers(&contents))
}

pub fn parse_answers(contents: &str) -> Vec<String> {
    contents.lines().map(|line| line.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_lines_and_keeps_blanks() {
        assert_eq!(
            parse_answers("John Doe \n\n  101\r\nFall"),
            vec!["John Doe", "", "101", "Fall"]
        );
    }

    #[test]
    fn missing_file_means_no_answers() {
        let temp = tempfile::tempdir().expect("tempdir");
        let answers = load_answers(&temp.path().join("input.txt")).expect("load");
        assert!(answers.is_empty());
    }

    #[test]
    fn reads_answers_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("input.txt");
        fs::write(&path, "1\n2\n9\n").expect("write");
        assert_eq!(load_answers(&path).expect("load"), vec!["1", "2", "9"]);
    }
}
