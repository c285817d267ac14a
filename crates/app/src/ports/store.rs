//! Automation store port — persistence and change feed for automations.

use std::future::Future;

use tokio::sync::broadcast;

use tempo_domain::automation::Automation;
use tempo_domain::error::TempoError;
use tempo_domain::id::AutomationId;

/// A change observed on the automation collection.
///
/// `Added` and `Modified` carry the new record state so the reactive path
/// can evaluate it without a round-trip to the store. `Removed` carries only
/// the identity; there is nothing left to dispatch.
#[derive(Debug, Clone)]
pub enum RecordChange {
    Added(Automation),
    Modified(Automation),
    Removed(AutomationId),
}

/// Store for persisting, querying, and watching [`Automation`]s.
///
/// The dispatch core only calls [`get_all`](Self::get_all),
/// [`delete`](Self::delete), and [`subscribe`](Self::subscribe); the
/// remaining operations exist for external record authors.
pub trait AutomationStore {
    /// Create a new automation in storage.
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TempoError>> + Send;

    /// Get an automation by its unique identifier.
    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, TempoError>> + Send;

    /// Get the entire current record set.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, TempoError>> + Send;

    /// Update an existing automation.
    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TempoError>> + Send;

    /// Delete an automation by its unique identifier.
    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), TempoError>> + Send;

    /// Subscribe to the record change feed.
    ///
    /// The receiver sees changes made *after* the subscription is created.
    /// A lagged receiver is acceptable; the periodic sweep covers anything
    /// the feed misses.
    fn subscribe(&self) -> broadcast::Receiver<RecordChange>;
}

impl<T: AutomationStore + Send + Sync> AutomationStore for std::sync::Arc<T> {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TempoError>> + Send {
        (**self).create(automation)
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, TempoError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, TempoError>> + Send {
        (**self).get_all()
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, TempoError>> + Send {
        (**self).update(automation)
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), TempoError>> + Send {
        (**self).delete(id)
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        (**self).subscribe()
    }
}
