//! Submission loading and fragment extraction from disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

use crate::core::fragment::extract_fragments;
use crate::core::types::Fragments;

/// A submission file and its identifier (file stem).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub path: PathBuf,
    pub source: String,
}

impl Submission {
    pub fn load(path: &Path) -> Result<Self> {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| anyhow!("submission path has no file stem: {}", path.display()))?
            .to_string();
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let source = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self {
            id,
            path: path.to_path_buf(),
            source,
        })
    }

    /// Extract the four routines; parse failures are logged and leave every slot empty.
    pub fn fragments(&self) -> Fragments {
        let fragments = extract_fragments(&self.source, &self.path.display().to_string());
        match &fragments.parse_error {
            Some(err) => warn!(submission = %self.id, err = %err, "submission did not parse"),
            None => debug!(submission = %self.id, found = fragments.found(), "fragments extracted"),
        }
        fragments
    }
}

/// List `*.py` submissions in `dir`, sorted by file name, skipping `exclude`.
pub fn discover_submissions(dir: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read submission entry")?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("py") {
            continue;
        }
        let name = entry.file_name();
        if exclude.iter().any(|skip| name.to_string_lossy() == skip.as_str()) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}
