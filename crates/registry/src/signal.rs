use async_trait::async_trait;

use crate::error::RegistryError;

/// Minimal publish side of the signal a process chain's completion raises to
/// wake whichever submission loop is awaiting it, so the controller doesn't
/// have to poll the process chain registry on a tight interval.
#[async_trait]
pub trait SignalBus: Send + Sync {
    async fn publish(&self, topic: &str) -> Result<(), RegistryError>;
}
