//! The preference form.
//!
//! A [`PreferenceForm`] holds the user-facing text values: what the device
//! reported, what the user typed, or what a profile file contained. It is
//! the sink the protocol writes to and the source `SET_*` commands are built
//! from.

use crate::error::ValidationError;
use crate::protocol::{FieldSink, HostCommand, ProtocolVariant, ValueTransform, fields};
use serde::{Deserialize, Serialize};

/// User preferences as text fields.
///
/// `service_no` backs both `serviceNo` (single-service firmware) and
/// `serviceNo1` (dual-service firmware).
///
/// # Examples
///
/// ```
/// use busnotify_config::core::PreferenceForm;
/// use busnotify_config::protocol::FieldSink;
///
/// let mut form = PreferenceForm::default();
/// form.set_field("busStop", "83139".to_string());
/// assert_eq!(form.field("busStop"), Some("83139"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceForm {
    /// Bus stop code.
    #[serde(rename = "busStop")]
    pub bus_stop: String,

    /// First (or only) monitored service.
    #[serde(rename = "serviceNo", alias = "serviceNo1")]
    pub service_no: String,

    /// Second monitored service (dual-service firmware only).
    #[serde(rename = "serviceNo2")]
    pub service_no_2: String,

    /// Start of the active window, `HH:MM`.
    #[serde(rename = "startTime")]
    pub start_time: String,

    /// End of the active window, `HH:MM`.
    #[serde(rename = "endTime")]
    pub end_time: String,

    /// Minutes of warning before arrival.
    #[serde(rename = "leadTime")]
    pub lead_time: String,

    /// WiFi network name.
    #[serde(rename = "wifiSSID")]
    pub wifi_ssid: String,

    /// WiFi password.
    #[serde(rename = "wifiPassword")]
    pub wifi_password: String,
}

impl PreferenceForm {
    /// Reads a field by its form name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            fields::BUS_STOP => &self.bus_stop,
            fields::SERVICE_NO | fields::SERVICE_NO_1 => &self.service_no,
            fields::SERVICE_NO_2 => &self.service_no_2,
            fields::START_TIME => &self.start_time,
            fields::END_TIME => &self.end_time,
            fields::LEAD_TIME => &self.lead_time,
            fields::WIFI_SSID => &self.wifi_ssid,
            fields::WIFI_PASSWORD => &self.wifi_password,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            fields::BUS_STOP => &mut self.bus_stop,
            fields::SERVICE_NO | fields::SERVICE_NO_1 => &mut self.service_no,
            fields::SERVICE_NO_2 => &mut self.service_no_2,
            fields::START_TIME => &mut self.start_time,
            fields::END_TIME => &mut self.end_time,
            fields::LEAD_TIME => &mut self.lead_time,
            fields::WIFI_SSID => &mut self.wifi_ssid,
            fields::WIFI_PASSWORD => &mut self.wifi_password,
            _ => return None,
        };
        Some(value)
    }

    /// Overlays every non-empty field of `other` onto this form.
    pub fn merge(&mut self, other: &Self) {
        let names = [
            fields::BUS_STOP,
            fields::SERVICE_NO,
            fields::SERVICE_NO_2,
            fields::START_TIME,
            fields::END_TIME,
            fields::LEAD_TIME,
            fields::WIFI_SSID,
            fields::WIFI_PASSWORD,
        ];
        for name in names {
            if let Some(value) = other.field(name)
                && !value.trim().is_empty()
            {
                self.set_field(name, value.to_string());
            }
        }
    }

    /// Returns `true` if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks the form before anything is sent to a device.
    ///
    /// Bus stop, first service, start, end and lead time are required.
    /// The second service and WiFi credentials may be empty.
    pub fn validate(&self, variant: ProtocolVariant) -> Result<(), ValidationError> {
        let table = variant.key_table();

        for binding in table.bindings() {
            let value = self.field(&binding.field).unwrap_or_default();
            if value.contains(['\n', '\r']) {
                return Err(ValidationError::LineBreak {
                    field: binding.field.clone(),
                });
            }
        }

        let primary_service = match variant {
            ProtocolVariant::SingleService => fields::SERVICE_NO,
            ProtocolVariant::DualService => fields::SERVICE_NO_1,
        };
        let required = [
            fields::BUS_STOP,
            primary_service,
            fields::START_TIME,
            fields::END_TIME,
            fields::LEAD_TIME,
        ];
        for name in required {
            if self.field(name).unwrap_or_default().trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: name.to_string(),
                });
            }
        }

        for binding in table.bindings() {
            if binding.transform != ValueTransform::MinuteOfDay {
                continue;
            }
            let value = self.field(&binding.field).unwrap_or_default().trim();
            if binding.transform.to_device(value).is_none() {
                return Err(ValidationError::InvalidTime {
                    field: binding.field.clone(),
                    value: value.to_string(),
                });
            }
        }

        let lead = self.lead_time.trim();
        if !lead.bytes().all(|b| b.is_ascii_digit()) || lead.parse::<u32>().is_err() {
            return Err(ValidationError::InvalidLeadTime {
                value: lead.to_string(),
            });
        }

        Ok(())
    }

    /// Builds the ordered `SET_*` commands that push this form to a device.
    ///
    /// Nothing is produced unless the whole form validates.
    pub fn to_commands(&self, variant: ProtocolVariant) -> Result<Vec<HostCommand>, ValidationError> {
        self.validate(variant)?;

        variant
            .key_table()
            .bindings()
            .iter()
            .map(|binding| {
                let value = self.field(&binding.field).unwrap_or_default().trim();
                let device_value = if value.is_empty() {
                    Some(String::new())
                } else {
                    binding.transform.to_device(value)
                };
                device_value
                    .map(|v| HostCommand::set(binding, v))
                    .ok_or_else(|| ValidationError::InvalidTime {
                        field: binding.field.clone(),
                        value: value.to_string(),
                    })
            })
            .collect()
    }
}

impl FieldSink for PreferenceForm {
    fn set_field(&mut self, field: &str, value: String) {
        match self.field_mut(field) {
            Some(slot) => *slot = value,
            None => tracing::debug!(field, "form has no such field"),
        }
    }
}
