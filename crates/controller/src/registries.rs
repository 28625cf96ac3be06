//! A single bound bundling the six registry contracts the controller
//! depends on, so `Controller<R>` can be generic over one type parameter
//! instead of threading five `Arc<dyn Trait>` fields. `InMemoryRegistry`
//! (and any real backend implementing all six traits on one struct)
//! satisfies this automatically via the blanket impl below.

use flowc_registry::{Lease, PluginRegistry, ProcessChainRegistry, ServiceMetadataRegistry, SignalBus, SubmissionRegistry};

pub trait Registries: SubmissionRegistry + ProcessChainRegistry + ServiceMetadataRegistry + PluginRegistry + Lease + SignalBus {}

impl<R> Registries for R where R: SubmissionRegistry + ProcessChainRegistry + ServiceMetadataRegistry + PluginRegistry + Lease + SignalBus {}
