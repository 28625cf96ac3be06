//! Registry contracts consumed by `flowc-compiler` and `flowc-controller`,
//! plus a single in-memory reference implementation of all of them.
//!
//! The distilled specification treats these as opaque external
//! collaborators (a submission store, a process chain store, a service
//! catalog, a plugin registry, a distributed lease, a signal bus); this
//! crate turns each into a narrow async trait so the controller can be
//! tested and run locally against `InMemoryRegistry` without a real
//! database or message bus.

mod error;
mod in_memory;
mod lease;
mod plugin;
mod process_chain;
mod service_metadata;
mod signal;
mod submission;

pub use error::RegistryError;
pub use in_memory::InMemoryRegistry;
pub use lease::{Lease, LeaseHandle};
pub use plugin::PluginRegistry;
pub use process_chain::ProcessChainRegistry;
pub use service_metadata::ServiceMetadataRegistry;
pub use signal::SignalBus;
pub use submission::SubmissionRegistry;
