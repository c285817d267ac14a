//! Dispatch routine — evaluates automations and fires the due ones.
//!
//! Both entry points (the change watcher and the minute sweep) feed records
//! into [`Dispatcher::evaluate`]. Because they can observe the same due
//! record within the same minute, the dispatcher claims a per-record
//! per-minute marker before publishing; whichever path loses the claim
//! backs off. This is what keeps a non-repeating record from firing twice.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tempo_domain::automation::Automation;
use tempo_domain::error::TempoError;
use tempo_domain::id::AutomationId;
use tempo_domain::time::{self, Timestamp};

use crate::ports::{AutomationStore, CommandSink};

/// What happened when a single record was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The record was not due (wrong minute or ineligible day).
    Skipped,
    /// The record was due but another evaluation already claimed this
    /// minute for it.
    Duplicate,
    /// Command published; the record repeats and stays in the store.
    Fired,
    /// Command published and the one-shot record deleted.
    FiredDeleted,
    /// The sink rejected or timed out; the record is left intact and may be
    /// retried while its minute is still due.
    PublishFailed,
    /// Command published but deleting the one-shot record failed. The stale
    /// record will read as not-due on later evaluations and never re-fires.
    DeleteFailed,
}

/// Per-record last-fired-minute marker.
///
/// `claim` transitions the marker from "not this minute" to "this minute"
/// under the lock; exactly one caller wins for a given record and minute.
#[derive(Debug, Default)]
struct FireGuard {
    fired: Mutex<HashMap<AutomationId, i64>>,
}

impl FireGuard {
    fn claim(&self, id: AutomationId, minute: i64) -> bool {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if fired.get(&id) == Some(&minute) {
            return false;
        }
        fired.insert(id, minute);
        true
    }

    /// Undo a claim so a failed publish can be retried within the minute.
    /// Only releases if the marker still belongs to `minute`.
    fn release(&self, id: AutomationId, minute: i64) {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if fired.get(&id) == Some(&minute) {
            fired.remove(&id);
        }
    }
}

/// The evaluate-and-dispatch routine shared by both entry points.
pub struct Dispatcher<S, P> {
    store: S,
    sink: P,
    guard: FireGuard,
}

impl<S, P> Dispatcher<S, P>
where
    S: AutomationStore,
    P: CommandSink,
{
    /// Create a new dispatcher over the given store and sink.
    pub fn new(store: S, sink: P) -> Self {
        Self {
            store,
            sink,
            guard: FireGuard::default(),
        }
    }

    /// Evaluate one automation against the given instant.
    ///
    /// Every failure is handled here: publish and delete errors are logged
    /// with the record identity and reported through the outcome, never
    /// propagated.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn evaluate(&self, automation: &Automation, now: Timestamp) -> DispatchOutcome {
        if !automation.is_due(now) {
            return DispatchOutcome::Skipped;
        }

        let minute = now.timestamp().div_euclid(60);
        if !self.guard.claim(automation.id, minute) {
            tracing::debug!("already fired this minute");
            return DispatchOutcome::Duplicate;
        }

        if let Err(err) = self
            .sink
            .publish(&automation.path, automation.command_payload(), true)
            .await
        {
            self.guard.release(automation.id, minute);
            tracing::warn!(%err, path = %automation.path, "publish failed, record left intact");
            return DispatchOutcome::PublishFailed;
        }
        tracing::info!(
            path = %automation.path,
            turn_on = automation.turn_on,
            "command published"
        );

        if automation.repeat {
            return DispatchOutcome::Fired;
        }

        match self.store.delete(automation.id).await {
            Ok(()) => {
                tracing::info!("one-shot automation deleted");
                DispatchOutcome::FiredDeleted
            }
            Err(err) => {
                tracing::error!(%err, "failed to delete fired one-shot automation");
                DispatchOutcome::DeleteFailed
            }
        }
    }

    /// Evaluate the entire record set against a single snapshot of "now".
    ///
    /// Returns the number of records that fired.
    ///
    /// # Errors
    ///
    /// Returns a storage error when fetching the record set fails; the
    /// whole pass is abandoned and the caller retries on its next trigger.
    pub async fn sweep_at(&self, now: Timestamp) -> Result<usize, TempoError> {
        let automations = self.store.get_all().await?;
        let mut fired = 0;
        for automation in &automations {
            match self.evaluate(automation, now).await {
                DispatchOutcome::Fired | DispatchOutcome::FiredDeleted => fired += 1,
                _ => {}
            }
        }
        Ok(fired)
    }

    /// Run one sweep pass at the current time.
    ///
    /// "Now" is captured once for the whole pass so a minute rollover
    /// mid-sweep cannot split the pass across two minutes.
    ///
    /// # Errors
    ///
    /// Same as [`sweep_at`](Self::sweep_at).
    pub async fn sweep(&self) -> Result<usize, TempoError> {
        self.sweep_at(time::now()).await
    }
}
