//! Detection and relocation of files a submission writes while running.
//!
//! A snapshot of matching file names is taken before execution; whatever
//! appears afterwards (minus excluded names) belongs to that submission.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Which files count as side effects and how long to wait for late writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectCapture {
    /// Extension without the dot.
    pub extension: String,
    /// File names never treated as side effects (e.g. the answers file).
    pub exclude: BTreeSet<String>,
    pub settle: Duration,
}

/// File names present before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(BTreeSet<String>);

/// Result of relocating new files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Relocation {
    pub moved: Vec<String>,
    /// Transcript-ready diagnostics.
    pub errors: Vec<String>,
}

impl SideEffectCapture {
    pub fn snapshot(&self, dir: &Path) -> Result<Snapshot> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
            let entry = entry.context("read entry")?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(self.extension.as_str())
            {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(Snapshot(names))
    }

    /// Wait for the settle delay, then move every new file from `dir` into `dest`.
    pub fn relocate_new(&self, dir: &Path, before: &Snapshot, dest: &Path) -> Relocation {
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        let mut relocation = Relocation::default();
        let after = match self.snapshot(dir) {
            Ok(after) => after,
            Err(err) => {
                relocation.errors.push(format!("File handling error: {err:#}"));
                return relocation;
            }
        };

        let fresh: Vec<&String> = after
            .0
            .difference(&before.0)
            .filter(|name| !self.exclude.contains(*name))
            .collect();
        if fresh.is_empty() {
            return relocation;
        }
        if let Err(err) = fs::create_dir_all(dest) {
            relocation.errors.push(format!(
                "File handling error: create {}: {err}",
                dest.display()
            ));
            return relocation;
        }

        for name in fresh {
            match move_file(&dir.join(name), &dest.join(name)) {
                Ok(()) => {
                    debug!(file = %name, dest = %dest.display(), "side-effect file relocated");
                    relocation.moved.push(name.clone());
                }
                Err(err) => {
                    warn!(file = %name, err = %err, "side-effect relocation failed");
                    relocation.errors.push(format!("File handling error: {err:#}"));
                }
            }
        }
        relocation
    }
}

fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst).with_context(|| format!("copy {} to {}", src.display(), dst.display()))?;
    fs::remove_file(src).with_context(|| format!("remove {}", src.display()))?;
    Ok(())
}
