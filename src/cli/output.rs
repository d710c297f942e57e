//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::PreferenceForm;
use crate::error::{CommandError, Error, Result};
use crate::protocol::{ProtocolVariant, fields};
use crate::session::SessionEvent;
use crate::transport::PortSummary;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown output format: {other} (expected text or json)"
            ))
            .into()),
        }
    }
}

/// What was read from a device or capture.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceReport<'a> {
    /// Where the data came from (port name or capture path).
    pub source: String,
    /// Firmware variant, if it became known.
    pub variant: Option<ProtocolVariant>,
    /// Whether at least one batch completed.
    pub complete: bool,
    /// Number of completed batches.
    pub batches: usize,
    /// Form values.
    pub preferences: &'a PreferenceForm,
}

/// Formats a port list.
#[must_use]
pub fn format_ports(ports: &[PortSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_ports_text(ports),
        OutputFormat::Json => format_json(&ports),
    }
}

fn format_ports_text(ports: &[PortSummary]) -> String {
    if ports.is_empty() {
        return "No serial ports found.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(output, "{:<24} {:<10} Product", "Port", "Type");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    for port in ports {
        let _ = writeln!(
            output,
            "{:<24} {:<10} {}",
            port.name,
            port.kind,
            port.product.as_deref().unwrap_or("-")
        );
    }
    output
}

/// Formats a preference report.
#[must_use]
pub fn format_report(report: &PreferenceReport<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_report_text(report),
        OutputFormat::Json => format_json(report),
    }
}

fn format_report_text(report: &PreferenceReport<'_>) -> String {
    let mut output = String::new();
    let variant = report
        .variant
        .map_or_else(|| "unknown variant".to_string(), |v| format!("{v}-service"));
    let status = if report.complete {
        "complete"
    } else {
        "incomplete"
    };
    let _ = writeln!(output, "Preferences from {} ({variant}, {status})", report.source);
    output.push_str(&format_form_text(report.preferences, report.variant));
    if report.batches > 1 {
        let _ = writeln!(output, "\n  Batches:       {}", report.batches);
    }
    output
}

/// Formats the result of a submit.
#[must_use]
pub fn format_submit(
    form: &PreferenceForm,
    variant: ProtocolVariant,
    commands: usize,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "Sent {commands} commands ({variant}-service firmware):"
            );
            output.push_str(&format_form_text(form, Some(variant)));
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SubmitResult<'a> {
                variant: ProtocolVariant,
                commands: usize,
                preferences: &'a PreferenceForm,
            }
            format_json(&SubmitResult {
                variant,
                commands,
                preferences: form,
            })
        }
    }
}

/// Formats one session event as a single line.
#[must_use]
pub fn format_event(event: &SessionEvent, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => match event {
            SessionEvent::FieldUpdated { field, value } => {
                format!("{field} = {}", display_value(field, value))
            }
            SessionEvent::BatchComplete(snapshot) => {
                format!("-- batch complete ({} keys)", snapshot.len())
            }
            SessionEvent::VariantSelected(variant) => format!("-- {variant}-service firmware"),
            SessionEvent::Connected { transport } => format!("-- connected to {transport}"),
            SessionEvent::Disconnected => "-- disconnected".to_string(),
            SessionEvent::StreamEnded => "-- stream ended".to_string(),
        },
        OutputFormat::Json => {
            let value = match event {
                SessionEvent::FieldUpdated { field, value } => {
                    serde_json::json!({ "event": "field", "field": field, "value": value })
                }
                SessionEvent::BatchComplete(snapshot) => {
                    serde_json::json!({ "event": "batch_complete", "keys": snapshot.len() })
                }
                SessionEvent::VariantSelected(variant) => {
                    serde_json::json!({ "event": "variant", "variant": variant })
                }
                SessionEvent::Connected { transport } => {
                    serde_json::json!({ "event": "connected", "transport": transport })
                }
                SessionEvent::Disconnected => serde_json::json!({ "event": "disconnected" }),
                SessionEvent::StreamEnded => serde_json::json!({ "event": "stream_ended" }),
            };
            value.to_string()
        }
    }
}

/// Formats an error for output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            let kind = match error {
                Error::Transport(_) => "transport",
                Error::Validation(_) => "validation",
                Error::Command(_) => "command",
                Error::Io(_) => "io",
                Error::Config { .. } => "config",
            };
            serde_json::json!({ "error": { "kind": kind, "message": error.to_string() } })
                .to_string()
        }
    }
}

fn format_form_text(form: &PreferenceForm, variant: Option<ProtocolVariant>) -> String {
    let mut rows = vec![("Bus stop", fields::BUS_STOP)];
    match variant {
        Some(ProtocolVariant::SingleService) => rows.push(("Service", fields::SERVICE_NO)),
        _ => rows.extend([
            ("Service 1", fields::SERVICE_NO_1),
            ("Service 2", fields::SERVICE_NO_2),
        ]),
    }
    rows.extend([
        ("Start", fields::START_TIME),
        ("End", fields::END_TIME),
        ("Lead time", fields::LEAD_TIME),
        ("WiFi SSID", fields::WIFI_SSID),
        ("WiFi password", fields::WIFI_PASSWORD),
    ]);

    let mut output = String::new();
    for (label, field) in rows {
        let value = form.field(field).unwrap_or_default();
        let shown = if value.is_empty() {
            "-".to_string()
        } else {
            display_value(field, value)
        };
        let _ = writeln!(output, "  {:<14} {shown}", format!("{label}:"));
    }
    output
}

/// Masks secrets for text display.
fn display_value(field: &str, value: &str) -> String {
    if field == fields::WIFI_PASSWORD && !value.is_empty() {
        "*".repeat(8)
    } else {
        value.to_string()
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, ValidationError};

    fn form() -> PreferenceForm {
        PreferenceForm {
            bus_stop: "83139".to_string(),
            service_no: "12".to_string(),
            start_time: "06:00".to_string(),
            wifi_password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert!(matches!(
            OutputFormat::parse("yaml"),
            Err(Error::Command(CommandError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_format_report_text_masks_password() {
        let form = form();
        let report = PreferenceReport {
            source: "/dev/ttyUSB0".to_string(),
            variant: Some(ProtocolVariant::DualService),
            complete: true,
            batches: 1,
            preferences: &form,
        };
        let text = format_report(&report, OutputFormat::Text);
        assert!(text.contains("dual-service, complete"));
        assert!(text.contains("83139"));
        assert!(text.contains("Service 2:"));
        assert!(text.contains("********"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_format_report_json() {
        let form = form();
        let report = PreferenceReport {
            source: "capture.log".to_string(),
            variant: Some(ProtocolVariant::SingleService),
            complete: false,
            batches: 0,
            preferences: &form,
        };
        let json: serde_json::Value =
            serde_json::from_str(&format_report(&report, OutputFormat::Json)).unwrap();
        assert_eq!(json["variant"], "single_service");
        assert_eq!(json["complete"], false);
        assert_eq!(json["preferences"]["busStop"], "83139");
    }

    #[test]
    fn test_format_ports() {
        assert_eq!(format_ports(&[], OutputFormat::Text), "No serial ports found.\n");
        let ports = vec![PortSummary {
            name: "/dev/ttyUSB0".to_string(),
            kind: "usb".to_string(),
            product: Some("CP2102".to_string()),
        }];
        let text = format_ports(&ports, OutputFormat::Text);
        assert!(text.contains("/dev/ttyUSB0"));
        assert!(text.contains("CP2102"));
    }

    #[test]
    fn test_format_event() {
        let event = SessionEvent::FieldUpdated {
            field: fields::WIFI_PASSWORD.to_string(),
            value: "bar".to_string(),
        };
        assert_eq!(format_event(&event, OutputFormat::Text), "wifiPassword = ********");
        let json = format_event(&event, OutputFormat::Json);
        assert!(json.contains("\"event\":\"field\""));
        assert_eq!(
            format_event(&SessionEvent::StreamEnded, OutputFormat::Text),
            "-- stream ended"
        );
    }

    #[test]
    fn test_format_error() {
        let err: Error = ValidationError::MissingField {
            field: "busStop".to_string(),
        }
        .into();
        assert!(format_error(&err, OutputFormat::Text).contains("busStop"));
        let json: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputFormat::Json)).unwrap();
        assert_eq!(json["error"]["kind"], "validation");

        let err: Error = TransportError::NotConnected.into();
        assert!(format_error(&err, OutputFormat::Json).contains("transport"));
    }
}
