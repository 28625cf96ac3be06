//! The output-adapter predicate consumed during process-chain fusion.
//!
//! The plugin registry itself (which data types have a registered output
//! adapter) lives outside this crate's scope; the compiler only needs the
//! yes/no answer, so it depends on this narrow trait rather than on
//! `flowc-registry` directly. `flowc-registry`'s `PluginRegistry` trait is
//! the producer-side contract; wiring code (the controller) adapts one to
//! the other.

/// `hasAdapterFor(dataType) -> bool`.
pub trait OutputAdapterOracle: Send {
    fn has_adapter_for(&self, data_type: &str) -> bool;
}

/// An oracle that never reports an adapter: fusion never stops early on its
/// account. Useful as a default for tests and for deployments with no
/// output-adapter plugins registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOutputAdapters;

impl OutputAdapterOracle for NoOutputAdapters {
    fn has_adapter_for(&self, _data_type: &str) -> bool {
        false
    }
}

/// Test/demo oracle that reports an adapter for a fixed set of data types.
#[derive(Debug, Default, Clone)]
pub struct StaticOutputAdapters {
    data_types: std::collections::HashSet<String>,
}

impl StaticOutputAdapters {
    pub fn new(data_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { data_types: data_types.into_iter().map(Into::into).collect() }
    }
}

impl OutputAdapterOracle for StaticOutputAdapters {
    fn has_adapter_for(&self, data_type: &str) -> bool {
        self.data_types.contains(data_type)
    }
}
