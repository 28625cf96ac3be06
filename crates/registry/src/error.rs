use thiserror::Error;

/// Error taxonomy for the registry contracts: a persistence-facing
/// counterpart to `flowc_compiler::CompileError`, kept separate because the
/// two crates are consumed by different callers (the compiler never touches
/// a registry, the controller never constructs a `CompileError`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("lease unavailable: {0}")]
    LeaseUnavailable(String),
    #[error("transient I/O error: {0}")]
    IoTransient(String),
}
