//! I/O helpers for grading a submission.

pub mod answers;
pub mod config;
pub mod extract;
pub mod process;
pub mod report;
pub mod sandbox;
pub mod side_effects;
