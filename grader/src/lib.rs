//! Grading pipeline for the menu-driven exercise.
//!
//! A submission flows strictly left to right: raw text, extracted routine
//! fragments, a reconstructed unit, static facts plus an execution transcript,
//! rubric decisions, and finally a persisted report. The crate keeps the same
//! split throughout:
//!
//! - **[`core`]**: Pure, deterministic logic (fragment extraction,
//!   reconstruction, static analysis, rubric evaluation). No I/O.
//! - **[`io`]**: Side-effecting operations (configuration, interpreter
//!   subprocesses, side-effect files, report artifacts).
//!
//! [`pipeline`] wires the two together for a single submission.

pub mod core;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
