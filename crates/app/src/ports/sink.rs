//! Command sink port — message delivery to the device transport.

use std::future::Future;

use tempo_domain::error::TempoError;

/// Delivers device commands to the messaging transport.
///
/// `publish` resolves once delivery is accepted (or has failed) within the
/// adapter's bounded timeout; a timeout counts as failure. Delivery is
/// at-least-once: callers may retry a failed publish.
pub trait CommandSink {
    /// Publish `payload` on `topic`, optionally asking the transport to
    /// retain the message for late subscribers.
    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> impl Future<Output = Result<(), TempoError>> + Send;
}

impl<T: CommandSink + Send + Sync> CommandSink for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> impl Future<Output = Result<(), TempoError>> + Send {
        (**self).publish(topic, payload, retain)
    }
}
