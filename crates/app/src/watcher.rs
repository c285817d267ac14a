//! Change watcher — reactive entry point into the dispatch routine.
//!
//! Drains the store's change feed and evaluates added or modified records
//! immediately, so a record authored for the current minute fires without
//! waiting for the sweep. Removed records carry nothing to dispatch.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use tempo_domain::time;

use crate::dispatcher::Dispatcher;
use crate::ports::{AutomationStore, CommandSink, RecordChange};

/// Reactive watcher over the record change feed.
pub struct ChangeWatcher<S, P> {
    dispatcher: Arc<Dispatcher<S, P>>,
    changes: broadcast::Receiver<RecordChange>,
    shutdown: watch::Receiver<bool>,
}

impl<S, P> ChangeWatcher<S, P>
where
    S: AutomationStore + Send + Sync + 'static,
    P: CommandSink + Send + Sync + 'static,
{
    /// Spawn the watcher task. Runs until the feed closes or shutdown is
    /// signalled.
    pub fn start(
        dispatcher: Arc<Dispatcher<S, P>>,
        changes: broadcast::Receiver<RecordChange>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let watcher = Self {
            dispatcher,
            changes,
            shutdown,
        };
        tokio::spawn(watcher.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                change = self.changes.recv() => match change {
                    Ok(RecordChange::Added(automation) | RecordChange::Modified(automation)) => {
                        let outcome = self.dispatcher.evaluate(&automation, time::now()).await;
                        tracing::debug!(
                            automation_id = %automation.id,
                            ?outcome,
                            "change evaluated"
                        );
                    }
                    Ok(RecordChange::Removed(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        // The sweep covers whatever the feed dropped.
                        tracing::warn!(skipped, "change feed lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("change feed closed, watcher stopping");
                        break;
                    }
                },
                _ = self.shutdown.changed() => {
                    tracing::info!("change watcher stopping");
                    break;
                }
            }
        }
    }
}
