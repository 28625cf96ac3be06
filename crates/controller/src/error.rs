use thiserror::Error;

use flowc_compiler::CompileError;
use flowc_registry::RegistryError;

/// Controller-level error taxonomy: wraps the compiler's and the
/// registries' own errors plus the one condition that is specific to the
/// per-submission loop itself (§7: `lease-unavailable` is "skip silently"
/// rather than a hard failure, surfaced here only so callers that want to
/// log it can match on it).
///
/// The compiler-not-finished case (§4.2's "not executed completely") is
/// *not* one of these variants: per the spec it is a terminal
/// `SubmissionStatus::Error` classification returned from `finalize`, not a
/// thrown error — `Controller::run_submission` still returns `Ok` with that
/// status.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("lease unavailable for submission {0}")]
    LeaseUnavailable(String),
}
