//! Host-to-device commands.

use super::variant::KeyBinding;
use std::fmt;

/// Asks the device to dump its current preferences.
pub const GET_PREFS: &str = "GET_PREFS";

/// A single command line sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// `GET_PREFS`
    GetPrefs,
    /// `SET_<KEY>=<value>`
    Set {
        /// Device key, without the `SET_` prefix.
        key: String,
        /// Device-side value.
        value: String,
    },
}

impl HostCommand {
    /// Builds a `SET_` command for a key binding.
    #[must_use]
    pub fn set(binding: &KeyBinding, value: impl Into<String>) -> Self {
        Self::Set {
            key: binding.key.clone(),
            value: value.into(),
        }
    }

    /// Encodes the command as a newline-terminated line.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetPrefs => f.write_str(GET_PREFS),
            Self::Set { key, value } => write!(f, "SET_{key}={value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::variant::{ProtocolVariant, fields};

    #[test]
    fn test_encode_get_prefs() {
        assert_eq!(HostCommand::GetPrefs.encode(), b"GET_PREFS\n");
    }

    #[test]
    fn test_encode_set() {
        let table = ProtocolVariant::DualService.key_table();
        let binding = table.binding_for_field(fields::WIFI_SSID).unwrap();
        let cmd = HostCommand::set(binding, "Home");
        assert_eq!(cmd.to_string(), "SET_WIFI_SSID=Home");
        assert_eq!(cmd.encode(), b"SET_WIFI_SSID=Home\n");
    }

    #[test]
    fn test_set_allows_empty_value() {
        let cmd = HostCommand::Set {
            key: "WIFI_PASSWORD".to_string(),
            value: String::new(),
        };
        assert_eq!(cmd.to_string(), "SET_WIFI_PASSWORD=");
    }
}
