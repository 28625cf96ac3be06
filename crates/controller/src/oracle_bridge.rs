//! Bridges the async [`flowc_registry::PluginRegistry`] (the persistence-facing
//! half of "is there an output adapter for data type D?") to the compiler's
//! synchronous [`flowc_compiler::OutputAdapterOracle`].
//!
//! `Compiler::generate` is synchronous and CPU-bound per the concurrency
//! model (§5: "no compiler call performs I/O"), so the controller can't hand
//! it an async trait object directly. Instead, before constructing a
//! `Compiler` for a submission, it resolves every output data type the
//! submission's services can produce against the plugin registry once, and
//! hands the compiler the resulting fixed set via `flowc_compiler::StaticOutputAdapters`.
//! A data type registering an adapter *after* a submission's compiler has
//! already been constructed is out of scope: the spec's oracle contract is a
//! point-in-time predicate, not a subscription.

use std::collections::HashSet;

use flowc_compiler::StaticOutputAdapters;
use flowc_registry::PluginRegistry;
use flowc_types::{Direction, ServiceMetadata};

use crate::error::ControllerError;

pub(crate) async fn resolve_output_adapters(
    plugin_registry: &dyn PluginRegistry,
    services: &[ServiceMetadata],
) -> Result<StaticOutputAdapters, ControllerError> {
    let data_types: HashSet<&str> =
        services.iter().flat_map(|s| s.parameters.iter()).filter(|p| p.kind == Direction::Output).map(|p| p.data_type.as_str()).collect();

    let mut with_adapter = Vec::new();
    for data_type in data_types {
        if plugin_registry.find_output_adapter(data_type).await? {
            with_adapter.push(data_type.to_string());
        }
    }
    Ok(StaticOutputAdapters::new(with_adapter))
}
