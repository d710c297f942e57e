//! Firmware key tables.
//!
//! Device firmware comes in more than one flavour, differing in which
//! preference keys it reports and which key closes a batch. Each flavour is
//! described as a [`KeyTable`]: a list of key-to-field bindings plus the
//! sentinel key. Keys both flavours report the same way form a shared
//! table without a sentinel, used until the flavour is known.

use super::time::{format_time, parse_minutes, parse_time};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Form field names written by the applier.
pub mod fields {
    /// Bus stop code.
    pub const BUS_STOP: &str = "busStop";
    /// Single monitored service (single-service firmware).
    pub const SERVICE_NO: &str = "serviceNo";
    /// First monitored service (dual-service firmware).
    pub const SERVICE_NO_1: &str = "serviceNo1";
    /// Second monitored service (dual-service firmware).
    pub const SERVICE_NO_2: &str = "serviceNo2";
    /// Start of the active window, `HH:MM`.
    pub const START_TIME: &str = "startTime";
    /// End of the active window, `HH:MM`.
    pub const END_TIME: &str = "endTime";
    /// Minutes of warning before arrival.
    pub const LEAD_TIME: &str = "leadTime";
    /// WiFi network name.
    pub const WIFI_SSID: &str = "wifiSSID";
    /// WiFi password.
    pub const WIFI_PASSWORD: &str = "wifiPassword";
}

/// Conversion between device values and form values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    /// Value passes through unchanged.
    Identity,
    /// Device minutes since midnight, shown as `HH:MM`.
    MinuteOfDay,
}

impl ValueTransform {
    /// Converts a device value into its form representation.
    ///
    /// Returns `None` when the value cannot be converted.
    #[must_use]
    pub fn to_form(self, device_value: &str) -> Option<String> {
        match self {
            Self::Identity => Some(device_value.to_string()),
            Self::MinuteOfDay => parse_minutes(device_value).and_then(format_time),
        }
    }

    /// Converts a form value into what the device expects.
    #[must_use]
    pub fn to_device(self, form_value: &str) -> Option<String> {
        match self {
            Self::Identity => Some(form_value.to_string()),
            Self::MinuteOfDay => parse_time(form_value).map(|minutes| minutes.to_string()),
        }
    }
}

/// Binding of one device key to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Key as reported by the device (`BUSSTOP`).
    pub key: String,
    /// Form field the value lands in (`busStop`).
    pub field: String,
    /// Value conversion between device and form.
    pub transform: ValueTransform,
}

impl KeyBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(key: &str, field: &str, transform: ValueTransform) -> Self {
        Self {
            key: key.to_string(),
            field: field.to_string(),
            transform,
        }
    }

    /// Name of the host command that writes this key (`SET_BUSSTOP`).
    #[must_use]
    pub fn set_command(&self) -> String {
        format!("SET_{}", self.key)
    }
}

/// Recognised keys and batch sentinel for one firmware flavour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTable {
    bindings: Vec<KeyBinding>,
    sentinel: Option<String>,
}

impl KeyTable {
    /// Creates a key table.
    ///
    /// Binding order is the order in which `SET_*` commands are sent.
    #[must_use]
    pub fn new(bindings: Vec<KeyBinding>, sentinel: &str) -> Self {
        Self {
            bindings,
            sentinel: Some(sentinel.to_string()),
        }
    }

    /// Creates a key table whose lines never complete a batch.
    #[must_use]
    pub const fn without_sentinel(bindings: Vec<KeyBinding>) -> Self {
        Self {
            bindings,
            sentinel: None,
        }
    }

    /// All bindings, in command order.
    #[must_use]
    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Key whose arrival completes a batch, if any.
    #[must_use]
    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    /// Looks up the binding for a device key.
    #[must_use]
    pub fn binding(&self, key: &str) -> Option<&KeyBinding> {
        self.bindings.iter().find(|b| b.key == key)
    }

    /// Looks up the binding for a form field.
    #[must_use]
    pub fn binding_for_field(&self, field: &str) -> Option<&KeyBinding> {
        self.bindings.iter().find(|b| b.field == field)
    }

    /// Returns `true` if the device key is recognised.
    #[must_use]
    pub fn recognises(&self, key: &str) -> bool {
        self.binding(key).is_some()
    }
}

/// Known firmware flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    /// One `SERVICE` key; the batch ends with `LEADTIME`.
    SingleService,
    /// `SERVICE1`/`SERVICE2` keys; the batch ends with `WIFI_PASSWORD`.
    DualService,
}

impl ProtocolVariant {
    /// All known variants.
    pub const ALL: [Self; 2] = [Self::SingleService, Self::DualService];

    /// Builds the key table for this variant.
    #[must_use]
    pub fn key_table(self) -> KeyTable {
        use ValueTransform::{Identity, MinuteOfDay};

        let mut bindings = vec![KeyBinding::new("BUSSTOP", fields::BUS_STOP, Identity)];
        match self {
            Self::SingleService => {
                bindings.push(KeyBinding::new("SERVICE", fields::SERVICE_NO, Identity));
            }
            Self::DualService => {
                bindings.push(KeyBinding::new("SERVICE1", fields::SERVICE_NO_1, Identity));
                bindings.push(KeyBinding::new("SERVICE2", fields::SERVICE_NO_2, Identity));
            }
        }
        bindings.extend([
            KeyBinding::new("START", fields::START_TIME, MinuteOfDay),
            KeyBinding::new("END", fields::END_TIME, MinuteOfDay),
            KeyBinding::new("LEADTIME", fields::LEAD_TIME, Identity),
            KeyBinding::new("WIFI_SSID", fields::WIFI_SSID, Identity),
            KeyBinding::new("WIFI_PASSWORD", fields::WIFI_PASSWORD, Identity),
        ]);

        KeyTable::new(bindings, self.sentinel())
    }

    /// Bindings every variant shares, with no sentinel.
    #[must_use]
    pub fn shared_key_table() -> KeyTable {
        let dual = Self::DualService.key_table();
        let bindings = Self::SingleService
            .key_table()
            .bindings()
            .iter()
            .filter(|b| dual.binding(&b.key) == Some(*b))
            .cloned()
            .collect();
        KeyTable::without_sentinel(bindings)
    }

    /// Sentinel key of this variant.
    #[must_use]
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::SingleService => "LEADTIME",
            Self::DualService => "WIFI_PASSWORD",
        }
    }

    /// Returns the variant whose service keys include `key`, if any.
    #[must_use]
    pub fn from_service_key(key: &str) -> Option<Self> {
        match key {
            "SERVICE" => Some(Self::SingleService),
            "SERVICE1" | "SERVICE2" => Some(Self::DualService),
            _ => None,
        }
    }

    /// Returns the variant whose sentinel is `key`, if any.
    #[must_use]
    pub fn from_sentinel(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.sentinel() == key)
    }

    /// Short name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SingleService => "single",
            Self::DualService => "dual",
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single-service" => Ok(Self::SingleService),
            "dual" | "dual-service" => Ok(Self::DualService),
            other => Err(format!("unknown protocol variant: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_service_table() {
        let table = ProtocolVariant::SingleService.key_table();
        assert_eq!(table.sentinel(), Some("LEADTIME"));
        assert!(table.recognises("SERVICE"));
        assert!(!table.recognises("SERVICE1"));
        assert!(table.recognises("WIFI_PASSWORD"));
        assert_eq!(table.bindings().len(), 7);
    }

    #[test]
    fn test_dual_service_table() {
        let table = ProtocolVariant::DualService.key_table();
        assert_eq!(table.sentinel(), Some("WIFI_PASSWORD"));
        assert!(table.recognises("SERVICE1"));
        assert!(table.recognises("SERVICE2"));
        assert!(!table.recognises("SERVICE"));
        assert_eq!(table.bindings().len(), 8);
    }

    #[test]
    fn test_sentinel_is_bound_in_every_variant() {
        for variant in ProtocolVariant::ALL {
            let table = variant.key_table();
            let sentinel = table.sentinel().unwrap();
            assert!(table.recognises(sentinel), "{variant}");
            assert_eq!(ProtocolVariant::from_sentinel(sentinel), Some(variant));
        }
    }

    #[test]
    fn test_shared_table_has_common_keys_only() {
        let table = ProtocolVariant::shared_key_table();
        assert_eq!(table.sentinel(), None);
        let keys: Vec<&str> = table.bindings().iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["BUSSTOP", "START", "END", "LEADTIME", "WIFI_SSID", "WIFI_PASSWORD"]
        );
        assert_eq!(ProtocolVariant::from_sentinel("START"), None);
    }

    #[test]
    fn test_binding_lookup() {
        let table = ProtocolVariant::DualService.key_table();
        let start = table.binding("START").unwrap();
        assert_eq!(start.field, fields::START_TIME);
        assert_eq!(start.transform, ValueTransform::MinuteOfDay);
        assert_eq!(start.set_command(), "SET_START");

        let by_field = table.binding_for_field(fields::SERVICE_NO_2).unwrap();
        assert_eq!(by_field.key, "SERVICE2");
    }

    #[test]
    fn test_transform_to_form() {
        assert_eq!(ValueTransform::MinuteOfDay.to_form("360").as_deref(), Some("06:00"));
        assert_eq!(ValueTransform::MinuteOfDay.to_form("abc"), None);
        assert_eq!(ValueTransform::MinuteOfDay.to_form("1440"), None);
        assert_eq!(ValueTransform::Identity.to_form("858").as_deref(), Some("858"));
    }

    #[test]
    fn test_transform_to_device() {
        assert_eq!(ValueTransform::MinuteOfDay.to_device("22:00").as_deref(), Some("1320"));
        assert_eq!(ValueTransform::MinuteOfDay.to_device("late"), None);
        assert_eq!(ValueTransform::Identity.to_device("x=y").as_deref(), Some("x=y"));
    }

    #[test]
    fn test_from_service_key() {
        assert_eq!(
            ProtocolVariant::from_service_key("SERVICE"),
            Some(ProtocolVariant::SingleService)
        );
        assert_eq!(
            ProtocolVariant::from_service_key("SERVICE2"),
            Some(ProtocolVariant::DualService)
        );
        assert_eq!(ProtocolVariant::from_service_key("BUSSTOP"), None);
    }

    #[test]
    fn test_variant_parse_and_display() {
        assert_eq!("single".parse(), Ok(ProtocolVariant::SingleService));
        assert_eq!("DUAL".parse(), Ok(ProtocolVariant::DualService));
        assert!("triple".parse::<ProtocolVariant>().is_err());
        assert_eq!(ProtocolVariant::DualService.to_string(), "dual");
    }

    #[test]
    fn test_key_table_serialization() {
        let table = ProtocolVariant::SingleService.key_table();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"minute_of_day\""));
        let back: KeyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
