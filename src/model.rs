use serde_json::Value;

/// Decoded `result` object of a realtime API response.
pub type FieldMap = serde_json::Map<String, Value>;

pub const WATT: &str = "W";
pub const KILO_WATT_HOUR: &str = "kWh";
pub const AMPERE: &str = "A";
pub const VOLT: &str = "V";
pub const CELSIUS: &str = "°C";
pub const HERTZ: &str = "Hz";
pub const PERCENTAGE: &str = "%";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Power,
    Energy,
    Current,
    Voltage,
    Temperature,
    Frequency,
    Battery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

/// Opaque credential pair identifying one inverter, plus an optional custom
/// API base URL that takes priority over the built-in endpoint catalog.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token_id: String,
    pub serial_number: String,
    pub api_base_url: Option<String>,
}

/// Description of one named metric, either resolved from the static catalog
/// or synthesized from an unrecognized payload field. Recomputed on every
/// mapping call, never persisted.
///
/// `source_field` is the raw payload field the value was read from, so value
/// lookup on a live snapshot does not need to repeat key resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub key: String,
    pub name: String,
    pub device_class: Option<DeviceClass>,
    pub unit: Option<&'static str>,
    pub state_class: Option<StateClass>,
    pub source_field: String,
}

/// Device identity fields, consumed separately from metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInfo {
    pub serial_number: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Extract device identity from a realtime payload. The API renamed these
    /// fields over firmware versions, so every known spelling is tried.
    pub fn from_payload(data: &FieldMap, serial_number: &str) -> DeviceInfo {
        let lookup = |spellings: &[&str]| {
            crate::mapper::resolve_field(data, spellings)
                .and_then(|field| data.get(field))
                .and_then(Value::as_str)
                .map(String::from)
        };

        DeviceInfo {
            serial_number: serial_number.to_string(),
            name: lookup(&["plantname", "plantName"]),
            model: lookup(&["invertertype", "inverterType", "type"]),
            sw_version: lookup(&["fwversion", "firmware", "fwVersion"]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::DeviceInfo;
    use serde_json::json;

    #[test]
    fn device_info_resolves_multi_spelling_fields() {
        let data = json!({
            "plantName": "My Plant",
            "inverterType": "X1",
            "fwVersion": "1.2.3",
            "acpower": 1200.0,
        });

        let info = DeviceInfo::from_payload(data.as_object().unwrap(), "XB1234");

        assert_eq!(info.serial_number, "XB1234");
        assert_eq!(info.name.as_deref(), Some("My Plant"));
        assert_eq!(info.model.as_deref(), Some("X1"));
        assert_eq!(info.sw_version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn device_info_tolerates_missing_fields() {
        let data = json!({ "acpower": 1200.0 });

        let info = DeviceInfo::from_payload(data.as_object().unwrap(), "XB1234");

        assert_eq!(info.name, None);
        assert_eq!(info.model, None);
        assert_eq!(info.sw_version, None);
    }
}
