use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

use crate::telemetry::config::TelemetryConfig;

/// Resource attribute naming the adapter that shaped the telemetry
pub const ADAPTER_NAME: &str = "telemetry.adapter.name";
pub const ADAPTER_VERSION: &str = "telemetry.adapter.version";

/// Attributes describing the instrumented service and this adapter
pub fn base_attributes(config: &TelemetryConfig) -> Vec<KeyValue> {
    vec![
        KeyValue::new(SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(SERVICE_VERSION, config.service_version.clone()),
        KeyValue::new(ADAPTER_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(ADAPTER_VERSION, env!("CARGO_PKG_VERSION")),
    ]
}

pub fn build_base_resource(config: &TelemetryConfig) -> Resource {
    build_resource(config, Vec::new())
}

/// Build resource with base + additional attributes
pub fn build_resource(config: &TelemetryConfig, additional: Vec<KeyValue>) -> Resource {
    let mut attrs = base_attributes(config);
    attrs.extend(additional);
    Resource::builder().with_attributes(attrs).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, Value};

    fn test_config() -> TelemetryConfig {
        TelemetryConfig::new("test-service", "1.2.3")
    }

    fn value_of(attrs: &[KeyValue], key: &str) -> Option<String> {
        attrs
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    #[test]
    fn base_attributes_describe_service() {
        let attrs = base_attributes(&test_config());

        assert_eq!(value_of(&attrs, SERVICE_NAME).as_deref(), Some("test-service"));
        assert_eq!(value_of(&attrs, SERVICE_VERSION).as_deref(), Some("1.2.3"));
    }

    #[test]
    fn base_attributes_name_the_adapter() {
        let attrs = base_attributes(&test_config());

        assert_eq!(value_of(&attrs, ADAPTER_NAME).as_deref(), Some("feature-telemetry"));
        assert_eq!(attrs.len(), 4);
    }

    #[test]
    fn build_resource_includes_additional_attrs() {
        let resource = build_resource(&test_config(), vec![KeyValue::new("deployment.slot", "blue")]);

        assert_eq!(resource.get(&Key::new("deployment.slot")), Some(Value::from("blue")));
        assert_eq!(resource.get(&Key::new(SERVICE_NAME)), Some(Value::from("test-service")));
    }
}
