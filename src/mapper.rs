use serde_json::Value;
use std::collections::HashSet;

use crate::model::{
    DeviceClass, FieldMap, MetricDescriptor, StateClass, AMPERE, CELSIUS, HERTZ, KILO_WATT_HOUR,
    PERCENTAGE, VOLT, WATT,
};

/// Payload fields describing the device rather than a time-varying metric.
/// Consumed for device identity instead, never emitted as metrics.
const DEVICE_METADATA_FIELDS: &[&str] = &[
    "plantname",
    "plant_name",
    "plantid",
    "plant_id",
    "timezone",
    "time_zone",
    "invertertype",
    "inverter_type",
    "type",
    "fwversion",
    "fw_version",
    "firmware",
    "serialnumber",
    "serial_number",
];

/// Unit-bearing words that get a separator inserted in front of them when
/// glued to a preceding word ("acpower" -> "ac_power").
const UNIT_WORDS: &[&str] = &[
    "power",
    "energy",
    "voltage",
    "current",
    "temperature",
    "frequency",
    "capacity",
];

/// Catalog entry for a well-known metric: canonical key, display metadata
/// and every field-name spelling the API has historically used for it.
pub struct StaticMetric {
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<DeviceClass>,
    pub unit: Option<&'static str>,
    pub state_class: Option<StateClass>,
    pub api_keys: &'static [&'static str],
}

pub const STATIC_CATALOG: &[StaticMetric] = &[
    StaticMetric {
        key: "ac_power",
        name: "AC Power",
        device_class: Some(DeviceClass::Power),
        unit: Some(WATT),
        state_class: Some(StateClass::Measurement),
        api_keys: &["acpower", "acPower"],
    },
    StaticMetric {
        key: "yield_today",
        name: "Yield Today",
        device_class: Some(DeviceClass::Energy),
        unit: Some(KILO_WATT_HOUR),
        state_class: Some(StateClass::TotalIncreasing),
        api_keys: &["yieldtoday", "yieldToday"],
    },
    StaticMetric {
        key: "yield_total",
        name: "Yield Total",
        device_class: Some(DeviceClass::Energy),
        unit: Some(KILO_WATT_HOUR),
        state_class: Some(StateClass::TotalIncreasing),
        api_keys: &["yieldtotal", "yieldTotal"],
    },
    StaticMetric {
        key: "feed_in_power",
        name: "Feed-in Power",
        device_class: Some(DeviceClass::Power),
        unit: Some(WATT),
        state_class: Some(StateClass::Measurement),
        api_keys: &["feedinpower", "feedInPower"],
    },
    StaticMetric {
        key: "feed_in_energy",
        name: "Feed-in Energy",
        device_class: Some(DeviceClass::Energy),
        unit: Some(KILO_WATT_HOUR),
        state_class: Some(StateClass::TotalIncreasing),
        api_keys: &["feedinenergy", "feedInEnergy"],
    },
    StaticMetric {
        key: "consume_energy",
        name: "Consumed Energy",
        device_class: Some(DeviceClass::Energy),
        unit: Some(KILO_WATT_HOUR),
        state_class: Some(StateClass::TotalIncreasing),
        api_keys: &["consumeenergy", "consumeEnergy"],
    },
    StaticMetric {
        key: "consume_energy_today",
        name: "Consumed Energy Today",
        device_class: Some(DeviceClass::Energy),
        unit: Some(KILO_WATT_HOUR),
        state_class: Some(StateClass::TotalIncreasing),
        api_keys: &["consumeenergy_today", "consumeEnergyToday"],
    },
    StaticMetric {
        key: "battery_power",
        name: "Battery Power",
        device_class: Some(DeviceClass::Power),
        unit: Some(WATT),
        state_class: Some(StateClass::Measurement),
        api_keys: &["bat_power", "batPower", "battery_power"],
    },
    StaticMetric {
        key: "soc",
        name: "State of Charge",
        device_class: Some(DeviceClass::Battery),
        unit: Some(PERCENTAGE),
        state_class: Some(StateClass::Measurement),
        api_keys: &["soc", "batterySoc"],
    },
    StaticMetric {
        key: "ac_frequency",
        name: "AC Frequency",
        device_class: Some(DeviceClass::Frequency),
        unit: Some(HERTZ),
        state_class: Some(StateClass::Measurement),
        api_keys: &["acfre", "acFre", "acFrequency"],
    },
    StaticMetric {
        key: "temperature",
        name: "Temperature",
        device_class: Some(DeviceClass::Temperature),
        unit: Some(CELSIUS),
        state_class: Some(StateClass::Measurement),
        /* "tempperature" is a real historical API spelling */
        api_keys: &["tempperature", "temperature"],
    },
];

/// One mapped metric: descriptor plus the raw value read from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub descriptor: MetricDescriptor,
    pub value: Value,
}

/// Resolve the actual payload field for a list of candidate spellings.
/// Per candidate: exact match first, then case-insensitive.
pub fn resolve_field<'a>(data: &'a FieldMap, candidates: &[&str]) -> Option<&'a str> {
    for candidate in candidates {
        if let Some(key) = data.keys().find(|key| key.as_str() == *candidate) {
            return Some(key.as_str());
        }
        if let Some(key) = data.keys().find(|key| key.eq_ignore_ascii_case(candidate)) {
            return Some(key.as_str());
        }
    }
    None
}

/// Derive a canonical slug from an arbitrary API field name.
///
/// A separator is inserted before an uppercase letter preceded by a lowercase
/// letter or digit ("pv1Voltage" -> "pv1_voltage"), and before a unit-bearing
/// word glued to a preceding lowercase letter or digit ("acpower" ->
/// "ac_power"). Everything is lowercased, non-alphanumeric runs collapse to a
/// single underscore and edge separators are trimmed.
pub fn slugify(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut slug = String::with_capacity(raw.len() + 4);

    for (i, &b) in bytes.iter().enumerate() {
        let after_word = i > 0 && (bytes[i - 1].is_ascii_lowercase() || bytes[i - 1].is_ascii_digit());
        if after_word && (b.is_ascii_uppercase() || unit_word_at(bytes, i)) {
            push_separator(&mut slug);
        }
        if b.is_ascii_alphanumeric() {
            slug.push(b.to_ascii_lowercase() as char);
        } else {
            push_separator(&mut slug);
        }
    }

    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

fn push_separator(slug: &mut String) {
    if !slug.is_empty() && !slug.ends_with('_') {
        slug.push('_');
    }
}

fn unit_word_at(bytes: &[u8], index: usize) -> bool {
    UNIT_WORDS.iter().any(|word| {
        bytes.len() >= index + word.len()
            && bytes[index..index + word.len()].eq_ignore_ascii_case(word.as_bytes())
    })
}

/// Human-readable display name from a slug.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<String>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Whether a value can be interpreted as a number: a non-boolean JSON number,
/// or a non-blank string parsing as a float after trimming.
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
        }
        _ => false,
    }
}

/// Read-time value coercion: strings parseable as floats are exposed as
/// floats, anything else passes through to the caller unchanged.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Best-guess device class, unit and state class from substring heuristics
/// over the slug. Rules are ordered and the first match wins; reordering
/// changes the classification of ambiguous slugs.
pub fn derive_units(
    slug: &str,
    value: &Value,
) -> (Option<DeviceClass>, Option<&'static str>, Option<StateClass>) {
    if !is_numeric(value) {
        /* Textual diagnostic fields get no statistical aggregation. */
        return (None, None, None);
    }

    if ["yield", "energy", "generation"].iter().any(|t| slug.contains(t)) {
        return (
            Some(DeviceClass::Energy),
            Some(KILO_WATT_HOUR),
            Some(StateClass::TotalIncreasing),
        );
    }
    if slug.contains("power") {
        return (
            Some(DeviceClass::Power),
            Some(WATT),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("current") || slug.ends_with("_a") {
        return (
            Some(DeviceClass::Current),
            Some(AMPERE),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("voltage") || slug.ends_with("_v") || slug.contains("_volt") {
        return (
            Some(DeviceClass::Voltage),
            Some(VOLT),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("temperature") || slug.contains("temp") {
        return (
            Some(DeviceClass::Temperature),
            Some(CELSIUS),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("frequency") || slug.contains("freq") || slug.contains("hz") {
        return (
            Some(DeviceClass::Frequency),
            Some(HERTZ),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("soc") || slug.contains("soh") || slug.contains("percent") {
        return (
            Some(DeviceClass::Battery),
            Some(PERCENTAGE),
            Some(StateClass::Measurement),
        );
    }
    if slug.contains("efficiency") {
        return (None, Some(PERCENTAGE), Some(StateClass::Measurement));
    }
    if slug.contains("capacity") {
        return (None, Some(KILO_WATT_HOUR), Some(StateClass::Measurement));
    }
    (None, None, Some(StateClass::Measurement))
}

/// Map a raw field map to an ordered metric set.
///
/// Phase 1 resolves the static catalog, claiming both the canonical key and
/// the matched field name; catalog entries absent from the payload are
/// silently skipped. Phase 2 synthesizes a metric for every remaining field
/// that is not device metadata and not null or blank, disambiguating slug
/// collisions with numeric suffixes in encounter order.
pub fn map(data: &FieldMap) -> Vec<Metric> {
    let mut metrics: Vec<Metric> = Vec::new();
    let mut claimed_keys: HashSet<String> = HashSet::new();
    let mut claimed_fields: HashSet<String> = HashSet::new();

    for entry in STATIC_CATALOG {
        let field = match resolve_field(data, entry.api_keys) {
            Some(field) => field.to_string(),
            None => continue,
        };
        claimed_keys.insert(entry.key.to_string());
        claimed_fields.insert(field.to_lowercase());
        metrics.push(Metric {
            descriptor: MetricDescriptor {
                key: entry.key.to_string(),
                name: entry.name.to_string(),
                device_class: entry.device_class,
                unit: entry.unit,
                state_class: entry.state_class,
                source_field: field.clone(),
            },
            value: data.get(&field).cloned().unwrap_or(Value::Null),
        });
    }

    for (field, value) in data {
        let lowered = field.to_lowercase();
        if claimed_fields.contains(&lowered)
            || DEVICE_METADATA_FIELDS.contains(&lowered.as_str())
        {
            continue;
        }
        if value.is_null() {
            continue;
        }
        if let Value::String(s) = value {
            if s.trim().is_empty() {
                continue;
            }
        }

        let slug = slugify(field);
        if slug.is_empty() {
            continue;
        }
        let key = dedupe_key(slug, &claimed_keys);
        claimed_keys.insert(key.clone());

        let (device_class, unit, state_class) = derive_units(&key, value);
        metrics.push(Metric {
            descriptor: MetricDescriptor {
                name: title_from_slug(&key),
                key,
                device_class,
                unit,
                state_class,
                source_field: field.clone(),
            },
            value: value.clone(),
        });
    }

    metrics
}

fn dedupe_key(slug: String, claimed: &HashSet<String>) -> String {
    if !claimed.contains(&slug) {
        return slug;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}", slug, counter);
        if !claimed.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
