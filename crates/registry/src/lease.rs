use std::time::Duration;

use async_trait::async_trait;

use crate::error::RegistryError;

/// Single-writer discipline for a submission: the controller holds a lease
/// for the duration it owns a submission's execution state, so two
/// controller instances (or two recovery passes after a crash) never drive
/// the same submission concurrently.
#[async_trait]
pub trait Lease: Send + Sync {
    /// Attempts to acquire the named lease within `timeout`, returning
    /// `None` (not an error) if it's already held by someone else when the
    /// timeout elapses.
    async fn try_lock(&self, name: &str, timeout: Duration) -> Result<Option<Box<dyn LeaseHandle>>, RegistryError>;
}

/// A held lease. Must be released on every exit path, including a
/// panicking submission task; callers that need that guarantee wrap the
/// handle in a `Drop`-based guard rather than relying on an explicit
/// `release()` call alone.
#[async_trait]
pub trait LeaseHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn release(&self) -> Result<(), RegistryError>;
}
