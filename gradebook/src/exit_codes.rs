//! Stable exit codes for gradebook CLI commands.

/// Command succeeded. Individual submission failures do not change this.
pub const OK: i32 = 0;
/// Invalid configuration or directory, or any other fatal error.
pub const INVALID: i32 = 1;
