//! Diagnostic tracing for grading runs.
//!
//! Spans cover one submission (`grade_submission`) and one interpreter run
//! (`Sandbox::execute`, `run_with_deadline`). Events within them record
//! fragment extraction, static facts, child exit and kill decisions, and
//! side-effect relocation. Parse failures and relocation problems log at
//! `warn`, pipeline failures at `error`.
//!
//! None of this reaches the per-submission reports or `grades.csv`, which are
//! written regardless of `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=grader=debug gradebook run submissions/
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
