//! Deterministic, pure logic shared by the grading pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! source text and facts and return deterministic outputs suitable for tests.

pub mod analysis;
pub mod fragment;
pub mod reconstruct;
pub mod rubric;
pub mod types;
