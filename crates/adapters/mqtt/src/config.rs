//! MQTT sink configuration.

use serde::Deserialize;

/// Configuration for the MQTT command sink.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Broker username. Credentials normally arrive via environment
    /// variables rather than the config file.
    pub username: Option<String>,
    /// Broker password.
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long a publish may take before it counts as failed, in seconds.
    pub publish_timeout_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "tempod".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            publish_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "tempod");
        assert!(config.username.is_none());
        assert!(config.password.is_none());
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.publish_timeout_secs, 10);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "my-dispatcher"
            username = "automations"
            password = "hunter2"
            keep_alive_secs = 60
            publish_timeout_secs = 5
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "my-dispatcher");
        assert_eq!(config.username.as_deref(), Some("automations"));
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.publish_timeout_secs, 5);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "tempod");
    }
}
