//! The two periodic tickers described in §4.3: submission discovery
//! (default 2 s) and orphan sweeping (default 5 min), each also
//! triggerable on demand and coalesced so a slow tick can't overlap the
//! next one for the *same* ticker (each ticker is a single sequential async
//! loop, so two of its own ticks can never run concurrently by
//! construction).

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::controller::Controller;
use crate::registries::Registries;

pub struct LookupLoop<R: Registries> {
    controller: Arc<Controller<R>>,
    lookup_notify: Notify,
    orphan_notify: Notify,
}

impl<R: Registries + 'static> LookupLoop<R> {
    pub fn new(controller: Arc<Controller<R>>) -> Self {
        Self { controller, lookup_notify: Notify::new(), orphan_notify: Notify::new() }
    }

    /// Wakes the submission-discovery ticker immediately instead of waiting
    /// for its next scheduled tick.
    pub fn trigger_lookup(&self) {
        self.lookup_notify.notify_one();
    }

    /// Wakes the orphan-sweep ticker immediately.
    pub fn trigger_orphan_scan(&self) {
        self.orphan_notify.notify_one();
    }

    /// Spawns both tickers as background tasks. The returned handles run
    /// forever; abort them (or drop the runtime) to stop.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let lookup_task = {
            let this = Arc::clone(&self);
            tokio::spawn(async move { this.run_lookup_ticker().await })
        };
        let orphan_task = {
            let this = Arc::clone(&self);
            tokio::spawn(async move { this.run_orphan_ticker().await })
        };
        (lookup_task, orphan_task)
    }

    async fn run_lookup_ticker(&self) {
        let mut ticker = tokio::time::interval(self.controller.config().lookup_interval());
        ticker.tick().await; // interval's first tick fires immediately
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.lookup_notify.notified() => {}
            }
            if let Err(error) = self.controller.discover_and_run().await {
                tracing::warn!(%error, "submission discovery tick failed");
            }
        }
    }

    async fn run_orphan_ticker(&self) {
        let mut ticker = tokio::time::interval(self.controller.config().orphan_lookup_interval());
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.orphan_notify.notified() => {}
            }
            if let Err(error) = self.controller.recover_orphans().await {
                tracing::warn!(%error, "orphan sweep tick failed");
            }
        }
    }
}
