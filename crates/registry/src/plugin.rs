use async_trait::async_trait;

use crate::error::RegistryError;

/// The persistence-facing half of the output-adapter lookup: whatever an
/// operator has installed to consume a data type downstream of the compiled
/// graph. `flowc_compiler::OutputAdapterOracle` is the compiler-facing half
/// of the same question; `flowc-controller` bridges the two with an adapter
/// that blocks on this trait's async call from the oracle's sync one.
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// Returns `true` if an output adapter plugin is registered for
    /// `data_type`.
    async fn find_output_adapter(&self, data_type: &str) -> Result<bool, RegistryError>;
}
