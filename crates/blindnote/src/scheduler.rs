//! Background purge of expired notes.
//!
//! Expiry is enforced at read time, so this only reclaims space. A failed
//! purge is logged and the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use blindnote_store::NoteStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::service::NoteService;

/// Spawns the periodic purge task.
pub struct PurgeScheduler;

impl PurgeScheduler {
    /// Purge once now, then once every `interval`, until shut down.
    pub fn spawn<S>(service: Arc<NoteService<S>>, interval: Duration) -> PurgeHandle
    where
        S: NoteStore + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // The first tick completes immediately.
                    _ = ticker.tick() => {
                        match service.purge().await {
                            Ok(0) => debug!("purge found nothing expired"),
                            Ok(removed) => info!(removed, "purged expired notes"),
                            Err(e) => warn!(error = %e, "purge failed"),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("purge scheduler stopping");
                            break;
                        }
                    }
                }
            }
        });

        PurgeHandle { shutdown_tx, task }
    }
}

/// Handle to a running purge task.
///
/// Dropping the handle also stops the task at its next wakeup.
pub struct PurgeHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PurgeHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "purge scheduler task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
