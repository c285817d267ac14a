//! MQTT adapter error types.

use tempo_domain::error::TempoError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected the publish request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The publish did not complete within the configured timeout.
    #[error("MQTT publish timed out")]
    Timeout,
}

impl MqttError {
    /// Convert into a [`TempoError::Publish`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> TempoError {
        TempoError::Publish(Box::new(self))
    }
}

impl From<MqttError> for TempoError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_timeout_error() {
        assert_eq!(MqttError::Timeout.to_string(), "MQTT publish timed out");
    }

    #[test]
    fn should_convert_timeout_to_publish_error() {
        let err: TempoError = MqttError::Timeout.into();
        assert!(matches!(err, TempoError::Publish(_)));
    }
}
