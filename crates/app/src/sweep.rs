//! Sweep scheduler — periodic entry point into the dispatch routine.
//!
//! Once per minute the scheduler fetches the entire record set and
//! evaluates every record against one snapshot of "now". This is the safety
//! net that fires due automations even when a change notification was
//! missed or a record has been stable since before process start.
//!
//! Rather than polling every second for `seconds == 0`, each round computes
//! the exact delay to the next wall-clock minute boundary and arms a
//! single-shot timer, so the trigger neither drifts nor double-fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tempo_domain::time::{self, Timestamp};

use crate::dispatcher::Dispatcher;
use crate::ports::{AutomationStore, CommandSink};

/// Time remaining until the next wall-clock minute boundary.
///
/// Always strictly positive: exactly on a boundary the full minute is
/// returned, which is what the re-arming loop wants.
#[must_use]
pub fn delay_to_next_minute(now: Timestamp) -> Duration {
    // Sub-second part is capped at 999ms; chrono reports leap seconds as
    // sub-second values >= 1000.
    let elapsed_ms =
        u64::from(now.second()) * 1_000 + u64::from(now.timestamp_subsec_millis().min(999));
    Duration::from_millis(60_000 - elapsed_ms)
}

/// Minute-aligned sweep loop.
pub struct SweepScheduler<S, P> {
    dispatcher: Arc<Dispatcher<S, P>>,
    shutdown: watch::Receiver<bool>,
}

impl<S, P> SweepScheduler<S, P>
where
    S: AutomationStore + Send + Sync + 'static,
    P: CommandSink + Send + Sync + 'static,
{
    /// Spawn the sweep task. Runs until shutdown is signalled; a sweep in
    /// flight when shutdown arrives completes before the task exits.
    pub fn start(
        dispatcher: Arc<Dispatcher<S, P>>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let scheduler = Self {
            dispatcher,
            shutdown,
        };
        tokio::spawn(scheduler.run())
    }

    async fn run(mut self) {
        loop {
            let delay = delay_to_next_minute(time::now());
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    match self.dispatcher.sweep().await {
                        Ok(fired) if fired > 0 => {
                            tracing::info!(fired, "sweep fired automations");
                        }
                        Ok(_) => tracing::debug!("sweep complete, nothing due"),
                        Err(err) => {
                            tracing::warn!(%err, "sweep failed, retrying next minute");
                        }
                    }
                }
                _ = self.shutdown.changed() => {
                    tracing::info!("sweep scheduler stopping");
                    break;
                }
            }
        }
    }
}
