//! Stable exit codes for saga CLI commands.

/// Command succeeded (scan printed, match found, path allowed).
pub const OK: i32 = 0;
/// Command failed due to invalid layout/arguments, a resolver miss, or a
/// provisioning error.
pub const INVALID: i32 = 1;
/// `saga check-path` denied the operation (the hook protocol's blocked code).
pub const BLOCKED: i32 = 2;
/// `saga find` matched more than one candidate; disambiguation required.
pub const AMBIGUOUS: i32 = 3;
