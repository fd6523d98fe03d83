//! Reconciles backend device state into device cards.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::dom::{ElementView, PageView};
use crate::params::format_number;

pub const DEVICE_ID_DATA_KEY: &str = "deviceId";
pub const STATUS_SELECTOR: &[&str] = &["device-status"];
pub const POWER_VALUE_SELECTOR: &[&str] = &["power-indicator", "value"];
pub const STATUS_ON_CLASS: &str = "status-on";
pub const STATUS_OFF_CLASS: &str = "status-off";

/// The slice of a device payload the card cares about.
///
/// Backend views carry more (`info`, `type`, `location`); those fields are
/// ignored. Every field tolerates a missing or oddly typed value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, rename = "isOn", deserialize_with = "truthy")]
    pub is_on: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub power: Option<f64>,
}

impl DeviceSnapshot {
    pub fn new(id: impl Into<String>, is_on: bool, power: Option<f64>) -> Self {
        Self {
            id: Some(id.into()),
            is_on,
            power,
        }
    }

    /// Lenient decode of one payload; non-objects yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Self::deserialize(value).ok()
    }

    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_on { "ON" } else { "OFF" }
    }

    #[must_use]
    pub fn power_label(&self) -> Option<String> {
        self.power.map(|power| format!("{}W", format_number(power)))
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// Device list from a `/devices` body. Anything but an array is treated as
/// empty; entries that are not objects are dropped.
#[must_use]
pub fn parse_devices(body: &Value) -> Vec<DeviceSnapshot> {
    body.as_array()
        .map(|entries| entries.iter().filter_map(DeviceSnapshot::from_value).collect())
        .unwrap_or_default()
}

#[must_use]
pub fn active_count(devices: &[DeviceSnapshot]) -> usize {
    devices.iter().filter(|device| device.is_on).count()
}

/// Writes `device` into its card. Returns false when there was nothing to
/// update: no id, or no card carrying that id.
///
/// Never creates or removes elements, and applying the same snapshot twice
/// leaves the card exactly as applying it once.
pub fn sync_device<P: PageView>(page: &P, device: &DeviceSnapshot) -> bool {
    let Some(id) = device.id.as_deref() else {
        return false;
    };
    let Some(card) = page.element_by_data(DEVICE_ID_DATA_KEY, id) else {
        return false;
    };

    if let Some(status) = card.find_descendant(STATUS_SELECTOR) {
        status.set_text(device.status_label());
        status.set_class(STATUS_ON_CLASS, device.is_on);
        status.set_class(STATUS_OFF_CLASS, !device.is_on);
    }

    if let (Some(value), Some(label)) = (card.find_descendant(POWER_VALUE_SELECTOR), device.power_label()) {
        value.set_text(&label);
    }
    true
}

/// Text for the home-mode header, taken from the `homeMode` field of a mode
/// change response. Empty or missing values leave the header alone.
#[must_use]
pub fn home_mode_label(result: &Value) -> Option<String> {
    match result.get("homeMode")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(mode) if mode.is_empty() => None,
        Value::String(mode) => Some(mode.clone()),
        other => Some(other.to_string()),
    }
}
