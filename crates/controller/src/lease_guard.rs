//! Per-submission exclusive lease, released on every exit path.
//!
//! §5 requires the lease to be released even on panic. The concrete
//! `LeaseHandle` implementations (e.g. `InMemoryRegistry`'s) already carry
//! their own synchronous `Drop` impl that clears the held-lease entry, so a
//! `LeaseGuard` dropped during an unwind (panicking submission task) still
//! releases through that inner `Drop` even though `release()`'s async
//! variant never gets to run. The guard's own async `release` is the
//! fast, explicit path used on every non-panicking exit; `Drop` is the
//! backstop.

use flowc_registry::LeaseHandle;

pub(crate) struct LeaseGuard {
    handle: Option<Box<dyn LeaseHandle>>,
}

impl LeaseGuard {
    pub(crate) fn new(handle: Box<dyn LeaseHandle>) -> Self {
        Self { handle: Some(handle) }
    }

    /// Explicitly releases the lease, consuming the guard. Prefer this over
    /// relying on `Drop` on any path that isn't unwinding.
    pub(crate) async fn release(mut self) {
        let Some(handle) = self.handle.take() else { return };
        if let Err(error) = handle.release().await {
            tracing::warn!(%error, lease = handle.name(), "failed to release submission lease explicitly; relying on Drop");
        }
    }
}
